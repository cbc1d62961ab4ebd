/// The parts of the page DOM the component assembler touches.
pub trait Document {
    /// Handle to an element of the page.
    type Element: Clone;

    fn query_selector(&self, selector: &str) -> Option<Self::Element>;

    /// Replaces the markup inside `element`.
    fn replace_content(&self, element: &Self::Element, html: &str);

    /// Every element carrying `attribute`, paired with the attribute value.
    fn nav_elements(&self, attribute: &str) -> Vec<(Self::Element, String)>;

    /// Adds `classes` and `aria-current="page"` to `element`.
    fn mark_active(&self, element: &Self::Element, classes: &[String]);

    /// Re-initializes the widget library published under the global `hook`.
    ///
    /// Returns `false` when the library is not present on the page.
    fn refresh_widgets(&self, hook: &str) -> bool;

    /// Sets the language attribute of the root element.
    fn set_language(&self, tag: &str);
}

impl<T: Document + ?Sized> Document for &T {
    type Element = T::Element;

    fn query_selector(&self, selector: &str) -> Option<Self::Element> {
        (**self).query_selector(selector)
    }

    fn replace_content(&self, element: &Self::Element, html: &str) {
        (**self).replace_content(element, html)
    }

    fn nav_elements(&self, attribute: &str) -> Vec<(Self::Element, String)> {
        (**self).nav_elements(attribute)
    }

    fn mark_active(&self, element: &Self::Element, classes: &[String]) {
        (**self).mark_active(element, classes)
    }

    fn refresh_widgets(&self, hook: &str) -> bool {
        (**self).refresh_widgets(hook)
    }

    fn set_language(&self, tag: &str) {
        (**self).set_language(tag)
    }
}

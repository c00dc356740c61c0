//! Grid selection model

use app_api::Image;
use std::collections::HashSet;

/// Multi-selection over image paths with a shift-click anchor
#[derive(Debug, Clone, Default)]
pub struct SelectionState {
    selected: HashSet<String>,
    /// Listing index of the last path added by a plain click
    anchor: Option<usize>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle one path. Adding it makes its index in `images` the anchor.
    pub fn toggle(&mut self, images: &[Image], path: &str) {
        if self.selected.remove(path) {
            return;
        }
        self.selected.insert(path.to_string());
        self.anchor = images.iter().position(|img| img.path == path);
    }

    /// Union the closed range between the anchor and `to` into the selection.
    /// Without an anchor this is a plain toggle of `images[to]`.
    pub fn select_range(&mut self, images: &[Image], to: usize) {
        let Some(target) = images.get(to) else {
            tracing::warn!(index = to, len = images.len(), "Range end outside listing");
            return;
        };

        let Some(anchor) = self.anchor else {
            let path = target.path.clone();
            self.toggle(images, &path);
            return;
        };

        let start = anchor.min(to);
        let end = anchor.max(to).min(images.len() - 1);
        for image in &images[start..=end] {
            self.selected.insert(image.path.clone());
        }
    }

    /// Grid click: shift with a non-empty selection extends, otherwise toggles
    pub fn click(&mut self, images: &[Image], index: usize, shift: bool) {
        if shift && !self.selected.is_empty() {
            self.select_range(images, index);
        } else if let Some(image) = images.get(index) {
            let path = image.path.clone();
            self.toggle(images, &path);
        }
    }

    pub fn clear(&mut self) {
        self.selected.clear();
        self.anchor = None;
    }

    pub fn contains(&self, path: &str) -> bool {
        self.selected.contains(path)
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn anchor(&self) -> Option<usize> {
        self.anchor
    }

    /// Selected paths in listing order; paths no longer listed come last, sorted
    pub fn paths(&self, images: &[Image]) -> Vec<String> {
        let mut listed: Vec<String> = images
            .iter()
            .filter(|img| self.selected.contains(&img.path))
            .map(|img| img.path.clone())
            .collect();

        let mut stale: Vec<String> = self
            .selected
            .iter()
            .filter(|p| !images.iter().any(|img| &img.path == *p))
            .cloned()
            .collect();
        stale.sort();

        listed.extend(stale);
        listed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn images(n: usize) -> Vec<Image> {
        (0..n).map(|i| Image::new(&format!("img_{}.png", i))).collect()
    }

    #[test]
    fn test_toggle_twice_restores() {
        let imgs = images(4);
        let mut sel = SelectionState::new();

        sel.toggle(&imgs, "img_2.png");
        assert!(sel.contains("img_2.png"));
        assert_eq!(sel.anchor(), Some(2));

        sel.toggle(&imgs, "img_2.png");
        assert!(!sel.contains("img_2.png"));
        assert!(sel.is_empty());
    }

    #[test]
    fn test_toggle_sequence_is_parity() {
        let imgs = images(5);
        let mut sel = SelectionState::new();
        let clicks = [0, 3, 0, 4, 3, 3, 1, 4];
        for &i in &clicks {
            sel.toggle(&imgs, &imgs[i].path);
        }

        for (i, img) in imgs.iter().enumerate() {
            let odd = clicks.iter().filter(|&&c| c == i).count() % 2 == 1;
            assert_eq!(sel.contains(&img.path), odd, "index {}", i);
        }
    }

    #[test]
    fn test_range_is_closed_interval_union() {
        let imgs = images(10);
        let mut sel = SelectionState::new();
        sel.toggle(&imgs, "img_8.png");
        sel.toggle(&imgs, "img_5.png");

        sel.click(&imgs, 2, true);

        let expected = ["img_2.png", "img_3.png", "img_4.png", "img_5.png", "img_8.png"];
        assert_eq!(sel.paths(&imgs), expected);
    }

    #[test]
    fn test_range_forward() {
        let imgs = images(6);
        let mut sel = SelectionState::new();
        sel.click(&imgs, 1, false);
        sel.click(&imgs, 4, true);
        assert_eq!(sel.paths(&imgs), ["img_1.png", "img_2.png", "img_3.png", "img_4.png"]);
        // Range select does not move the anchor
        assert_eq!(sel.anchor(), Some(1));
    }

    #[test]
    fn test_shift_with_empty_selection_toggles() {
        let imgs = images(3);
        let mut sel = SelectionState::new();
        sel.click(&imgs, 2, true);
        assert_eq!(sel.paths(&imgs), ["img_2.png"]);
    }

    #[test]
    fn test_range_without_anchor_toggles() {
        let imgs = images(3);
        let mut sel = SelectionState::new();
        sel.toggle(&imgs, "elsewhere.png");
        assert_eq!(sel.anchor(), None);

        sel.click(&imgs, 1, true);
        assert!(sel.contains("img_1.png"));
        assert!(!sel.contains("img_0.png"));
    }

    #[test]
    fn test_range_uses_current_listing_order() {
        let first = images(5);
        let mut sel = SelectionState::new();
        sel.toggle(&first, "img_3.png");

        // New listing, anchor index still 3
        let second: Vec<Image> = (0..5).map(|i| Image::new(&format!("other_{}.png", i))).collect();
        sel.select_range(&second, 1);
        assert!(sel.contains("other_1.png"));
        assert!(sel.contains("other_3.png"));
        assert!(!sel.contains("other_4.png"));
        // Stale path survives in memory
        assert!(sel.contains("img_3.png"));
    }

    #[test]
    fn test_range_clamps_anchor_past_end() {
        let first = images(8);
        let mut sel = SelectionState::new();
        sel.toggle(&first, "img_7.png");

        let shorter = images(3);
        sel.select_range(&shorter, 0);
        assert_eq!(sel.paths(&shorter)[..3], ["img_0.png", "img_1.png", "img_2.png"]);
    }

    #[test]
    fn test_clear_resets_anchor() {
        let imgs = images(3);
        let mut sel = SelectionState::new();
        sel.toggle(&imgs, "img_1.png");
        sel.clear();
        assert!(sel.is_empty());
        assert_eq!(sel.anchor(), None);
    }
}

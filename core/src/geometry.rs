use serde::{Deserialize, Serialize};

/// Position and size of a shape, in host length units (points).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShapeBox {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl ShapeBox {
    pub const fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }
}

/// Proportions used when an image is placed beside a content placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageLayout {
    /// Image width as a fraction of the content width.
    pub width_ratio: f64,
    /// Image height as a fraction of the content height.
    pub height_ratio: f64,
    /// Horizontal gap between the image and the shifted content.
    pub gutter: f64,
}

impl Default for ImageLayout {
    fn default() -> Self {
        Self {
            width_ratio: 0.4,
            height_ratio: 0.9,
            gutter: 10.0,
        }
    }
}

/// Where the image goes and where the content moves to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SideBySide {
    pub image: ShapeBox,
    pub content: ShapeBox,
}

impl ImageLayout {
    /// Splits `content` into an image on the left, vertically centred, and
    /// the remaining text region on the right.
    pub fn place_beside(&self, content: ShapeBox) -> SideBySide {
        let image_width = content.width * self.width_ratio;
        let image_height = content.height * self.height_ratio;
        let image = ShapeBox {
            left: content.left,
            top: content.top + (content.height - image_height) / 2.0,
            width: image_width,
            height: image_height,
        };
        let shift = image_width + self.gutter;
        let content = ShapeBox {
            left: content.left + shift,
            top: content.top,
            width: content.width - shift,
            height: content.height,
        };
        SideBySide { image, content }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn test_default_split() {
        let placed = ImageLayout::default().place_beside(ShapeBox::new(50.0, 100.0, 600.0, 300.0));
        assert!(close(placed.image.left, 50.0));
        assert!(close(placed.image.width, 240.0));
        assert!(close(placed.image.height, 270.0));
        assert!(close(placed.image.top, 115.0));
        assert!(close(placed.content.left, 300.0));
        assert!(close(placed.content.width, 350.0));
        assert!(close(placed.content.top, 100.0));
        assert!(close(placed.content.height, 300.0));
    }

    #[test]
    fn test_custom_ratios() {
        let layout = ImageLayout {
            width_ratio: 0.5,
            height_ratio: 1.0,
            gutter: 0.0,
        };
        let placed = layout.place_beside(ShapeBox::new(0.0, 0.0, 100.0, 80.0));
        assert!(close(placed.image.right(), placed.content.left));
        assert!(close(placed.image.top, 0.0));
    }

    proptest! {
        #[test]
        fn prop_image_and_content_share_row(
            left in 0.0f64..500.0,
            top in 0.0f64..500.0,
            w in 50.0f64..1000.0,
            h in 20.0f64..800.0,
        ) {
            let placed = ImageLayout::default().place_beside(ShapeBox::new(left, top, w, h));
            prop_assert!(close(placed.image.width, 0.4 * w));
            prop_assert!(close(placed.image.height, 0.9 * h));
            prop_assert!(close(placed.content.width, w - 0.4 * w - 10.0));
            prop_assert!(close(placed.content.left, left + 0.4 * w + 10.0));
            prop_assert!(placed.image.right() <= placed.content.left);
            prop_assert!(close(placed.content.right(), left + w));
        }
    }
}

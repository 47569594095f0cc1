//! Connected-component segmentation.
//!
//! Black pixels that touch, including diagonally, belong to the same
//! component. Each component is reported as its bounding rectangle, in the
//! order its first pixel is met when scanning rows top to bottom and each
//! row left to right.

use std::collections::VecDeque;

use crate::bitmap::Bitmap;
use crate::rect::Rect;
use crate::view::{Raster, View};

const NEIGHBOURS: [(i32, i32); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Bounding rectangles of the 8-connected black components of `raster`, in
/// local coordinates.
pub fn components<R: Raster + ?Sized>(raster: &R) -> Vec<Rect> {
    let (width, height) = (raster.width() as i32, raster.height() as i32);
    let mut visited = vec![false; width as usize * height as usize];
    let index = |x: i32, y: i32| y as usize * width as usize + x as usize;
    let mut regions = Vec::new();
    let mut queue = VecDeque::new();

    for y in 0..height {
        for x in 0..width {
            if visited[index(x, y)] || raster.pixel(x, y) == 0 {
                continue;
            }
            visited[index(x, y)] = true;
            queue.push_back((x, y));
            let (mut min_x, mut min_y, mut max_x, mut max_y) = (x, y, x, y);

            while let Some((px, py)) = queue.pop_front() {
                min_x = min_x.min(px);
                min_y = min_y.min(py);
                max_x = max_x.max(px);
                max_y = max_y.max(py);
                for (dx, dy) in NEIGHBOURS {
                    let (nx, ny) = (px + dx, py + dy);
                    if nx < 0 || ny < 0 || nx >= width || ny >= height {
                        continue;
                    }
                    if !visited[index(nx, ny)] && raster.pixel(nx, ny) != 0 {
                        visited[index(nx, ny)] = true;
                        queue.push_back((nx, ny));
                    }
                }
            }
            regions.push(Rect::new(min_x, min_y, max_x + 1, max_y + 1));
        }
    }
    log::debug!("segmented {} components", regions.len());
    regions
}

impl<'a> View<'a> {
    /// One view per connected component, in discovery order.
    pub fn characters(&self) -> Vec<View<'a>> {
        components(self)
            .into_iter()
            .filter_map(|area| self.select(area))
            .collect()
    }
}

impl Bitmap {
    /// Copy of every connected component, in discovery order.
    pub fn cut_characters(&self) -> Vec<Bitmap> {
        self.select_all()
            .characters()
            .iter()
            .map(|view| view.to_bitmap())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagonal_pixels_connect() {
        let mut img = Bitmap::new(8, 8);
        img.set_black(2, 2);
        img.set_black(3, 3);
        assert_eq!(components(&img), vec![Rect::new(2, 2, 4, 4)]);

        let mut apart = Bitmap::new(8, 8);
        apart.set_black(2, 2);
        apart.set_black(4, 4);
        assert_eq!(
            components(&apart),
            vec![Rect::new(2, 2, 3, 3), Rect::new(4, 4, 5, 5)]
        );
    }

    #[test]
    fn test_discovery_order_is_row_major() {
        // A tall bar on the right starts higher than a dot on the left
        let mut img = Bitmap::new(16, 8);
        img.set_black(1, 4);
        for y in 1..7 {
            img.set_black(10, y);
        }
        assert_eq!(
            components(&img),
            vec![Rect::new(10, 1, 11, 7), Rect::new(1, 4, 2, 5)]
        );
    }

    #[test]
    fn test_u_shape_is_one_component() {
        let mut img = Bitmap::new(8, 5);
        for y in 0..5 {
            img.set_black(1, y);
            img.set_black(5, y);
        }
        for x in 1..6 {
            img.set_black(x, 4);
        }
        assert_eq!(components(&img), vec![Rect::new(1, 0, 6, 5)]);
    }

    #[test]
    fn test_characters_are_global_views() {
        let mut img = Bitmap::new(16, 4);
        img.set_black(9, 1);
        img.set_black(12, 2);
        let right = img.select(Rect::new(8, 0, 16, 4)).unwrap();
        let chars = right.characters();
        assert_eq!(chars.len(), 2);
        assert_eq!(chars[0].area(), Rect::new(9, 1, 10, 2));
        assert_eq!(chars[1].area(), Rect::new(12, 2, 13, 3));

        let cut = img.cut_characters();
        assert_eq!(cut.len(), 2);
        assert_eq!((cut[0].width(), cut[0].height()), (8, 1));
        assert_eq!(cut[0].pixel(0, 0), 1);
    }

    #[test]
    fn test_blank_has_no_components() {
        assert!(components(&Bitmap::new(16, 16)).is_empty());
        assert!(components(&Bitmap::new(0, 0)).is_empty());
    }
}

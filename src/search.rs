//! Locating patterns inside a raster, and edits driven by the match.

use crate::bitmap::{resolve_index, Bitmap};
use crate::pattern::Pattern;
use crate::rect::{Point, Rect};
use crate::view::{Raster, View};

impl Pattern {
    /// Search area resolved against a `width x height` target and clipped
    /// to it.
    pub fn effective_area(&self, width: u32, height: u32) -> Rect {
        let full = Rect::new(0, 0, width as i32, height as i32);
        match self.raw_search_area() {
            None => full,
            Some(area) => Rect::new(
                resolve_index(area.x0, width),
                resolve_index(area.y0, height),
                resolve_index(area.x1, width),
                resolve_index(area.y1, height),
            )
            .intersect(&full),
        }
    }

    /// Candidate origins `(x range, y list)` in scan order, or `None` when
    /// the pattern cannot fit in the search area.
    fn scan_ranges(&self, width: u32, height: u32) -> Option<(i32, i32, Vec<i32>)> {
        let area = self.effective_area(width, height);
        let (w, h) = (self.width() as i32, self.height() as i32);
        if w == 0 || h == 0 || area.width() < w || area.height() < h {
            return None;
        }
        let max_x = area.x1 - w;
        let max_y = area.y1 - h;
        let rows: Vec<i32> = if self.is_from_bottom() {
            (area.y0..=max_y).rev().collect()
        } else {
            (area.y0..=max_y).collect()
        };
        log::debug!(
            "search {}x{} in {} ({} rows)",
            w,
            h,
            area,
            rows.len()
        );
        Some((area.x0, max_x, rows))
    }

    /// Top-left corner of the first match in scan order.
    pub fn search_first<R: Raster + ?Sized>(&self, target: &R) -> Option<Point> {
        let (min_x, max_x, rows) = self.scan_ranges(target.width(), target.height())?;
        for y in rows {
            for x in min_x..=max_x {
                if self.is_match_at(target, x, y) {
                    return Some(Point::new(x, y));
                }
            }
        }
        None
    }

    /// Top-left corners of all non-overlapping matches, in scan order.
    ///
    /// After a match the scan resumes right of the matched rectangle, and
    /// candidates that would overlap an earlier match are skipped.
    pub fn search_all<R: Raster + ?Sized>(&self, target: &R) -> Vec<Point> {
        let mut matches = Vec::new();
        let (min_x, max_x, rows) = match self.scan_ranges(target.width(), target.height()) {
            Some(ranges) => ranges,
            None => return matches,
        };
        let mut claimed: Vec<Rect> = Vec::new();
        for y in rows {
            let mut x = min_x;
            while x <= max_x {
                let candidate = self.rect_at(Point::new(x, y));
                if let Some(hit) = claimed.iter().find(|r| r.overlaps(&candidate)) {
                    x = hit.x1;
                    continue;
                }
                if self.is_match_at(target, x, y) {
                    matches.push(Point::new(x, y));
                    claimed.push(candidate);
                    x += self.width() as i32;
                } else {
                    x += 1;
                }
            }
        }
        log::debug!("search found {} matches", matches.len());
        matches
    }

    /// First match as a view into the same owner as `view`.
    pub fn first_match<'a>(&self, view: &View<'a>) -> Option<View<'a>> {
        let origin = self.search_first(view)?;
        view.select(self.rect_at(origin))
    }

    /// All non-overlapping matches as views into the same owner as `view`.
    pub fn all_matches<'a>(&self, view: &View<'a>) -> Vec<View<'a>> {
        self.search_all(view)
            .into_iter()
            .filter_map(|origin| view.select(self.rect_at(origin)))
            .collect()
    }
}

impl Bitmap {
    /// Crop the first match of `pattern`. `None` if there is no match.
    pub fn with_crop_at_match(&self, pattern: &Pattern) -> Option<Bitmap> {
        let origin = pattern.search_first(self)?;
        self.with_crop(
            origin.x,
            origin.y,
            pattern.width() as i32,
            pattern.height() as i32,
        )
    }

    /// Erase the first match of `pattern`. Unchanged copy if there is none.
    pub fn with_erase_at_match(&self, pattern: &Pattern) -> Bitmap {
        match pattern.search_first(self) {
            Some(origin) => self.with_erase(
                origin.x,
                origin.y,
                pattern.width() as i32,
                pattern.height() as i32,
            ),
            None => self.clone(),
        }
    }

    /// Delete the rows covered by the first match of `pattern`.
    ///
    /// Unchanged copy if there is no match, `None` if the match spans every
    /// row.
    pub fn with_delete_rows_at_match(&self, pattern: &Pattern) -> Option<Bitmap> {
        match pattern.search_first(self) {
            Some(origin) => {
                self.with_delete_rows(origin.y, origin.y + pattern.height() as i32 - 1)
            }
            None => Some(self.clone()),
        }
    }

    /// Outline every non-overlapping match of `pattern`.
    pub fn with_border_at_all_matches(&self, pattern: &Pattern) -> Bitmap {
        let mut out = self.clone();
        for origin in pattern.search_all(self) {
            out.draw_outline(pattern.rect_at(origin));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dots() -> Bitmap {
        // 2x2 black squares at (2,1), (10,1) and (4,5)
        let mut img = Bitmap::new(16, 8);
        for (x, y) in [(2, 1), (10, 1), (4, 5)] {
            img.select_mut(Rect::from_size(x, y, 2, 2)).unwrap().fill_black();
        }
        img
    }

    fn square() -> Pattern {
        Pattern::new(2, 2).black_area(Rect::new(0, 0, 2, 2))
    }

    #[test]
    fn test_search_first_directions() {
        let img = dots();
        assert_eq!(square().search_first(&img), Some(Point::new(2, 1)));
        assert_eq!(
            square().from_bottom(true).search_first(&img),
            Some(Point::new(4, 5))
        );
    }

    #[test]
    fn test_search_area_negative_coordinates() {
        let img = dots();
        let right = square().search_area(Rect::new(-8, 0, i32::MAX, i32::MAX));
        assert_eq!(right.effective_area(16, 8), Rect::new(8, 0, 16, 8));
        assert_eq!(right.search_first(&img), Some(Point::new(10, 1)));

        let nothing = square().search_area(Rect::new(0, -2, 4, i32::MAX));
        assert_eq!(nothing.search_first(&img), None);
    }

    #[test]
    fn test_search_all_scan_order() {
        let img = dots();
        assert_eq!(
            square().search_all(&img),
            vec![Point::new(2, 1), Point::new(10, 1), Point::new(4, 5)]
        );
    }

    #[test]
    fn test_search_all_never_overlaps() {
        let mut img = Bitmap::new(16, 8);
        img.select_mut(Rect::new(0, 0, 16, 8)).unwrap().fill_black();
        let p = Pattern::new(3, 3).black_area(Rect::new(0, 0, 3, 3));
        let found = p.search_all(&img);
        assert_eq!(found.len(), 10);
        for (i, a) in found.iter().enumerate() {
            for b in &found[i + 1..] {
                assert!(!p.rect_at(*a).overlaps(&p.rect_at(*b)));
            }
        }
    }

    #[test]
    fn test_matches_as_views() {
        let img = dots();
        let all = img.select_all();
        let first = square().first_match(&all).unwrap();
        assert_eq!(first.area(), Rect::new(2, 1, 4, 3));
        assert_eq!(first.black_ratio(), 1.0);

        let right = all.select(Rect::new(8, 0, 16, 8)).unwrap();
        let found = square().all_matches(&right);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].area(), Rect::new(10, 1, 12, 3));
    }

    #[test]
    fn test_derived_edits() {
        let img = dots();
        let crop = img.with_crop_at_match(&square()).unwrap();
        assert!(crop.pixel(0, 0) == 1 && crop.pixel(1, 1) == 1);

        let erased = img.with_erase_at_match(&square());
        assert_eq!(erased.black_count(), 8);
        assert_eq!(erased.pixel(2, 1), 0);

        let deleted = img.with_delete_rows_at_match(&square()).unwrap();
        assert_eq!(deleted.height(), 6);
        assert_eq!(deleted.pixel(4, 3), 1);

        let halo = Pattern::new(4, 4)
            .black_area(Rect::new(1, 1, 3, 3))
            .white_point(0, 0)
            .white_point(-1, -1);
        let framed = img.with_border_at_all_matches(&halo);
        assert_eq!(img.pixel(1, 0), 0);
        assert_eq!(framed.pixel(1, 0), 1);
        assert_eq!(framed.pixel(12, 3), 1);
        assert_eq!(framed.pixel(6, 7), 1);
        assert_eq!(framed.pixel(2, 2), 1);

        let miss = Pattern::new(2, 2).white_point(0, 0).black_ratio(1.0, 1.0);
        assert!(img.with_crop_at_match(&miss).is_none());
        assert_eq!(img.with_erase_at_match(&miss), img);
        assert_eq!(img.with_delete_rows_at_match(&miss).unwrap(), img);
    }
}

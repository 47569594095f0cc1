use epos_raster::{
    components, decode_raster_commands, Bitmap, Color, Pattern, Point, Raster, RasterHeader, Rect,
    RASTER_HEADER_LEN,
};

// Deterministic noise so every test sees the same picture
fn noise(width: u32, height: u32, seed: u32) -> Bitmap {
    let len = (width / 8 * height) as usize;
    let mut state = seed;
    let content = (0..len)
        .map(|_| {
            state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            (state >> 16) as u8
        })
        .collect();
    Bitmap::from_bytes(width, height, content).unwrap()
}

#[test]
fn set_then_get_pixel() {
    let mut img = Bitmap::new(24, 10);
    for &(x, y) in &[(0, 0), (23, 9), (7, 3), (8, 3), (-1, -1)] {
        img.set_pixel(x, y, 1);
        assert_eq!(img.pixel(x, y), 1);
        img.set_pixel(x, y, 0);
        assert_eq!(img.pixel(x, y), 0);
    }

    let before = img.clone();
    for &(x, y) in &[(24, 0), (0, 10), (-25, 0), (0, -11), (1000, 1000)] {
        img.set_pixel(x, y, 1);
        assert_eq!(img.pixel(x, y), 0);
    }
    assert_eq!(img, before);
}

#[test]
fn crop_then_paste_restores_region() {
    let img = noise(32, 12, 7);
    let crop = img.with_crop(8, 3, 16, 5).unwrap();
    assert_eq!(img.with_paste(&crop, 8, 3), img);

    // Unaligned crops carry white padding that must not clear the original
    let crop = img.with_crop(3, 2, 13, 6).unwrap();
    assert_eq!(crop.width(), 16);
    assert_eq!(img.with_paste(&crop, 3, 2), img);

    let pasted = Bitmap::new(32, 12).with_paste(&crop, 3, 2);
    for y in 0..12 {
        for x in 0..32 {
            let inside = (3..16).contains(&x) && (2..8).contains(&y);
            let expected = if inside { img.pixel(x, y) } else { 0 };
            assert_eq!(pasted.pixel(x, y), expected, "at ({}, {})", x, y);
        }
    }
}

#[test]
fn unaligned_crop_pastes_back_onto_solid_black() {
    let img = Bitmap::from_bytes(32, 4, vec![0xFF; 16]).unwrap();
    let crop = img.with_crop(3, 0, 13, 4).unwrap();
    assert_eq!(img.with_paste(&crop, 3, 0), img);
}

#[test]
fn append_then_crop_rows() {
    let a = noise(16, 5, 1);
    let b = noise(16, 3, 2);
    let both = a.with_append(&b).unwrap();
    assert_eq!(both.with_crop_rows(0, a.height() as i32 - 1).unwrap(), a);
    assert_eq!(both.with_crop_rows(a.height() as i32, -1).unwrap(), b);
    assert!(a.with_append(&Bitmap::new(24, 1)).is_none());
}

#[test]
fn cut_pages_properties() {
    let a = noise(24, 6, 3);
    let b = noise(24, 4, 4);

    let stack = a.with_cutline().with_append(&b).unwrap();
    let pages = stack.cut_pages();
    assert_eq!(pages.len(), 2);
    assert_eq!(pages[0].height() + pages[1].height(), stack.height() - 1);

    assert_eq!(a.cut_pages(), vec![a.clone()]);

    let trailing = stack.with_cutline().cut_pages();
    assert_eq!(trailing, vec![a, b]);
}

#[test]
fn pattern_from_own_pixels_matches() {
    let img = noise(32, 16, 9);
    let template = img.with_crop(5, 4, 6, 5).unwrap();
    let template = template.select(Rect::new(0, 0, 6, 5)).unwrap();
    let pattern = Pattern::from_raster(&template);
    assert!(pattern.is_match_at(&img, 5, 4));

    for &(dx, dy) in &[(0, 0), (5, 4), (2, 3)] {
        let flipped = match pattern.color_at(dx, dy).unwrap() {
            Color::Black => Color::White,
            Color::White => Color::Black,
        };
        let broken = pattern.clone().point(dx, dy, flipped);
        assert!(!broken.is_match_at(&img, 5, 4), "flip at ({}, {})", dx, dy);
    }
}

#[test]
fn search_all_results_do_not_overlap() {
    let img = noise(48, 24, 11);
    let patterns = vec![
        Pattern::new(1, 1),
        Pattern::new(3, 2),
        Pattern::new(5, 4).black_point(0, 0),
        Pattern::new(2, 3).white_point(1, 1).black_point(0, -1),
        Pattern::new(4, 4).from_bottom(true),
    ];
    for pattern in patterns {
        let hits = pattern.search_all(&img);
        assert!(!hits.is_empty());
        let rects: Vec<Rect> = hits.iter().map(|p| pattern.rect_at(*p)).collect();
        for (i, a) in rects.iter().enumerate() {
            for b in &rects[i + 1..] {
                assert!(!a.overlaps(b), "{} overlaps {}", a, b);
            }
        }
    }
}

#[test]
fn unconstrained_pattern_tiles_the_bitmap() {
    let img = Bitmap::new(16, 6);
    let hits = Pattern::new(4, 3).search_all(&img);
    assert_eq!(hits.len(), 8);
    assert_eq!(hits[0], Point::new(0, 0));
    assert_eq!(hits[4], Point::new(0, 3));
}

#[test]
fn raster_bands_cover_height() {
    let img = noise(40, 23, 5);
    for max in [1u32, 4, 7, 23, 100] {
        let data = img.to_raster_commands(max);
        let bands = decode_raster_commands(&data).unwrap();
        assert_eq!(bands.len() as u32, (img.height() + max - 1) / max);
        assert_eq!(bands.iter().map(|b| b.height()).sum::<u32>(), img.height());

        let header = RasterHeader::parse(&data).unwrap();
        assert_eq!(header.width_bytes as usize, img.width_bytes());
    }
}

#[test]
fn white_16x8_in_two_bands() {
    let img = Bitmap::from_bytes(16, 8, vec![0x00; 16]).unwrap();
    let data = img.to_raster_commands(4);
    assert_eq!(data.len(), 2 * (RASTER_HEADER_LEN + 8));
    for block in data.chunks(RASTER_HEADER_LEN + 8) {
        assert_eq!(&block[..RASTER_HEADER_LEN], &[0x1D, 0x76, 0x30, 0x00, 2, 0, 4, 0]);
        assert!(block[RASTER_HEADER_LEN..].iter().all(|&b| b == 0));
    }
}

#[test]
fn diagonal_dots_segmentation() {
    let mut touching = Bitmap::new(8, 8);
    touching.set_black(3, 3);
    touching.set_black(4, 4);
    assert_eq!(components(&touching).len(), 1);

    let mut apart = Bitmap::new(8, 8);
    apart.set_black(3, 3);
    apart.set_black(5, 5);
    assert_eq!(components(&apart).len(), 2);
}

#[test]
fn view_cut_extracts_and_clears() {
    let mut img = noise(16, 8, 13);
    let original = img.clone();
    let area = Rect::new(8, 2, 16, 6);
    let copy = img.select(area).unwrap().to_bitmap();
    let cut = img.select_mut(area).unwrap().cut();
    assert_eq!(cut, copy);
    assert!(img.select(area).unwrap().black_ratio() == 0.0);
    assert_eq!(
        img.select(Rect::new(0, 0, 8, 8)).unwrap().to_bitmap(),
        original.select(Rect::new(0, 0, 8, 8)).unwrap().to_bitmap()
    );
}

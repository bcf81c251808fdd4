//! Selection filter regression test
//!
//! Erosion of a solid block, growth of a single pixel, opening/closing
//! containment, inversion, the radius-(1, 1) border shortcut and feathering
//! against a full 2-D Gaussian.

use rasterfx_core::{ColorSpace, PaintDevice, PixelSelection, Rect, SELECTED, UNSELECTED};
use rasterfx_filter::{BorderOp, ConvolutionKernel, ConvolutionPainter, EnginePreference};
use rasterfx_morph::{
    BorderSelectionFilter, DilateSelectionFilter, ErodeSelectionFilter, FeatherSelectionFilter,
    GrowSelectionFilter, InvertSelectionFilter, SelectionFilter, ShrinkSelectionFilter,
    SmoothSelectionFilter,
};
use rasterfx_test::{RegParams, fixtures};

fn apply(filter: &dyn SelectionFilter, mask: &PixelSelection, rect: Rect) -> PixelSelection {
    let mut out = mask.clone();
    let area = filter.change_rect(rect, mask.default_bounds());
    filter.process(&mut out, area).expect("process");
    out
}

/// Every pixel of `inner` that is selected is also selected in `outer`
fn contained(inner: &PixelSelection, outer: &PixelSelection, rect: Rect) -> bool {
    (rect.y..rect.bottom())
        .flat_map(|y| (rect.x..rect.right()).map(move |x| (x, y)))
        .all(|(x, y)| inner.value(x, y) <= outer.value(x, y))
}

fn shapes(bounds: Rect) -> PixelSelection {
    let mut mask = fixtures::disk_mask(bounds, 20, 20, 7).unwrap();
    mask.fill(Rect::new_unchecked(8, 30, 20, 6), SELECTED).unwrap();
    mask.fill(Rect::new_unchecked(30, 8, 5, 14), SELECTED).unwrap();
    mask
}

#[test]
fn selection_erode_block_reg() {
    let mut rp = RegParams::new("selection_erode_block");
    let bounds = Rect::new_unchecked(0, 0, 9, 9);
    let block = Rect::new_unchecked(2, 2, 5, 5);
    let mask = fixtures::mask_with_rect(bounds, block, SELECTED).unwrap();

    let eroded = apply(&ErodeSelectionFilter, &mask, block);
    let expected =
        fixtures::mask_with_rect(bounds, Rect::new_unchecked(3, 3, 3, 3), SELECTED).unwrap();
    rp.compare_masks(&expected, &eroded, bounds);

    // Dilating the eroded block adds back the edge centers but not the corners
    let dilated = apply(&DilateSelectionFilter, &eroded, Rect::new_unchecked(3, 3, 3, 3));
    rp.compare_values(f64::from(SELECTED), f64::from(dilated.value(2, 4)), 0.0);
    rp.compare_values(f64::from(UNSELECTED), f64::from(dilated.value(2, 2)), 0.0);

    // Byte dump of the eroded mask against tests/golden
    rp.write_device_and_check(eroded.device(), bounds)
        .expect("write eroded mask");

    assert!(rp.cleanup(), "selection_erode_block regression test failed");
}

#[test]
fn selection_grow_pixel_reg() {
    let mut rp = RegParams::new("selection_grow_pixel");
    let bounds = Rect::new_unchecked(0, 0, 21, 21);
    let mut mask = PixelSelection::new(bounds);
    mask.set_value(10, 10, SELECTED);

    let grown = apply(&GrowSelectionFilter::new(2, 2), &mask, Rect::new_unchecked(10, 10, 1, 1));
    rp.compare_values(255.0, f64::from(grown.value(10, 10)), 0.0);

    let mut area = 0;
    for y in bounds.y..bounds.bottom() {
        for x in bounds.x..bounds.right() {
            let v = grown.value(x, y);
            if v == 0 {
                continue;
            }
            area += 1;
            let (dx, dy) = (x - 10, y - 10);
            rp.compare_values(0.0, f64::from((dx * dx + dy * dy > 8) as u8), 0.0);
            // Symmetric about the center in both axes
            rp.compare_values(f64::from(v), f64::from(grown.value(10 - dx, 10 + dy)), 0.0);
            rp.compare_values(f64::from(v), f64::from(grown.value(10 + dx, 10 - dy)), 0.0);
        }
    }
    eprintln!("  grown area {}", area);
    rp.compare_values(21.0, f64::from(area), 0.0);

    assert!(rp.cleanup(), "selection_grow_pixel regression test failed");
}

#[test]
fn selection_open_close_reg() {
    let mut rp = RegParams::new("selection_open_close");
    let bounds = Rect::new_unchecked(0, 0, 48, 48);
    let mask = shapes(bounds);

    for (xr, yr) in [(1, 1), (2, 2), (3, 2)] {
        let grow = GrowSelectionFilter::new(xr, yr);
        let shrink = ShrinkSelectionFilter::new(xr, yr, false);

        let closed = apply(&shrink, &apply(&grow, &mask, bounds), bounds);
        let opened = apply(&grow, &apply(&shrink, &mask, bounds), bounds);
        eprintln!("  radius ({}, {})", xr, yr);
        rp.compare_values(1.0, f64::from(contained(&mask, &closed, bounds) as u8), 0.0);
        rp.compare_values(1.0, f64::from(contained(&opened, &mask, bounds) as u8), 0.0);

        let closed_twice = apply(&shrink, &apply(&grow, &closed, bounds), bounds);
        rp.compare_masks(&closed, &closed_twice, bounds);
        let opened_twice = apply(&grow, &apply(&shrink, &opened, bounds), bounds);
        rp.compare_masks(&opened, &opened_twice, bounds);
    }

    assert!(rp.cleanup(), "selection_open_close regression test failed");
}

#[test]
fn selection_invert_reg() {
    let mut rp = RegParams::new("selection_invert");
    let bounds = Rect::new_unchecked(0, 0, 30, 20);
    let mask = fixtures::random_mask(bounds, 17).unwrap();

    let once = apply(&InvertSelectionFilter, &mask, Rect::new_unchecked(3, 3, 2, 2));
    rp.compare_values(
        f64::from(SELECTED - mask.value(7, 9)),
        f64::from(once.value(7, 9)),
        0.0,
    );
    rp.compare_values(f64::from(SELECTED), f64::from(once.value(100, 100)), 0.0);

    let twice = apply(&InvertSelectionFilter, &once, bounds);
    let wide = bounds.adjusted(-5, -5, 5, 5);
    rp.compare_masks(&mask, &twice, wide);

    assert!(rp.cleanup(), "selection_invert regression test failed");
}

#[test]
fn selection_border_unit_radius_reg() {
    let mut rp = RegParams::new("selection_border_unit_radius");
    let bounds = Rect::new_unchecked(0, 0, 48, 48);
    let mask = shapes(bounds);
    let filter = BorderSelectionFilter::new(1, 1);

    let mut unit = mask.clone();
    filter.process(&mut unit, bounds).unwrap();
    let mut antialiased = mask.clone();
    filter.process_antialiased(&mut antialiased, bounds).unwrap();

    // The shortcut writes only the transition map. The antialiased path also
    // leaves 127 on the edge-adjacent and 74 on the diagonal neighbors of each
    // transition, so the two agree on the fully selected pixels only.

    let mut full = PixelSelection::new(bounds);
    for y in bounds.y..bounds.bottom() {
        for x in bounds.x..bounds.right() {
            if antialiased.value(x, y) == SELECTED {
                full.set_value(x, y, SELECTED);
            }
        }
    }
    rp.compare_masks(&unit, &full, bounds);

    // Only the falloff differs: every antialiased value is partial or full
    let edge = antialiased.value(21, 20 - 8);
    eprintln!("  falloff just outside the disk {}", edge);
    rp.compare_values(1.0, f64::from((edge > 0 && edge < SELECTED) as u8), 0.0);

    assert!(rp.cleanup(), "selection_border_unit_radius regression test failed");
}

#[test]
fn selection_feather_reg() {
    let mut rp = RegParams::new("selection_feather");
    let bounds = Rect::new_unchecked(0, 0, 32, 24);
    let mask = fixtures::random_mask(bounds, 3).unwrap();
    let cs = ColorSpace::alpha8();

    for radius in [1, 2, 4] {
        let feather = FeatherSelectionFilter::new(radius)
            .with_engine_preference(EnginePreference::Spatial);
        let mut feathered = mask.clone();
        feather.process(&mut feathered, bounds).unwrap();

        let h = ConvolutionKernel::gaussian(radius as usize).unwrap();
        let full = ConvolutionKernel::outer_product(&h, &h.transposed()).unwrap();
        let mut painter = ConvolutionPainter::new();
        painter
            .set_channel_flags(cs.channel_flags(false, true))
            .set_engine_preference(EnginePreference::Spatial);
        let mut expected = PaintDevice::with_bounds(cs.clone(), bounds);
        painter
            .apply_matrix(
                &full,
                mask.device(),
                &mut expected,
                bounds.top_left(),
                bounds.top_left(),
                bounds.size(),
                BorderOp::Repeat,
            )
            .unwrap();

        eprintln!("  feather radius {}", radius);
        rp.compare_devices(feathered.device(), &expected, bounds, 2.0);
    }

    assert!(rp.cleanup(), "selection_feather regression test failed");
}

#[test]
fn selection_noop_reg() {
    let mut rp = RegParams::new("selection_noop");
    let bounds = Rect::new_unchecked(0, 0, 16, 16);
    let mask = fixtures::random_mask(bounds, 11).unwrap();

    let noops: Vec<Box<dyn SelectionFilter>> = vec![
        Box::new(GrowSelectionFilter::new(0, 2)),
        Box::new(ShrinkSelectionFilter::new(2, 0, true)),
        Box::new(BorderSelectionFilter::new(-1, 3)),
        Box::new(FeatherSelectionFilter::new(0)),
    ];
    for filter in &noops {
        let out = apply(filter.as_ref(), &mask, bounds);
        rp.compare_masks(&mask, &out, bounds);
    }

    let mut empty = mask.clone();
    SmoothSelectionFilter
        .process(&mut empty, Rect::new_unchecked(4, 4, 0, 0))
        .unwrap();
    rp.compare_masks(&mask, &empty, bounds);

    assert!(rp.cleanup(), "selection_noop regression test failed");
}

#[test]
fn selection_names_reg() {
    let filters: Vec<Box<dyn SelectionFilter>> = vec![
        Box::new(ErodeSelectionFilter),
        Box::new(DilateSelectionFilter),
        Box::new(BorderSelectionFilter::new(2, 2)),
        Box::new(FeatherSelectionFilter::new(2)),
        Box::new(GrowSelectionFilter::new(2, 2)),
        Box::new(ShrinkSelectionFilter::new(2, 2, false)),
        Box::new(SmoothSelectionFilter),
        Box::new(InvertSelectionFilter),
    ];
    let names: Vec<&str> = filters.iter().map(|f| f.name()).collect();
    assert_eq!(
        names,
        [
            "Erode Selection",
            "Dilate Selection",
            "Border Selection",
            "Feather Selection",
            "Grow Selection",
            "Shrink Selection",
            "Smooth Selection",
            "Invert Selection",
        ]
    );
}

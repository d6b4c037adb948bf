mod proptest_helpers;

use std::path::Path;

use proptest::prelude::*;
use proptest_helpers::{arb_image_and_bbox, proptest_config};
use trackprep::ir::io_yolo::{format_label_line, parse_label_line};
use trackprep::ir::{ImageRecord, NormalizedLabel};

proptest! {
    #![proptest_config(proptest_config())]

    #[test]
    fn in_bounds_boxes_normalize_into_unit_range(((w, h), bbox) in arb_image_and_bbox()) {
        let image = ImageRecord::new(1u64, "frame.jpg", w, h);
        let norm = image.normalize(&bbox).expect("non-zero dimensions");

        prop_assert!(norm.is_within_unit(), "{norm:?} from {bbox:?} on {w}x{h}");
    }

    #[test]
    fn to_pixel_recovers_the_source_box(((w, h), bbox) in arb_image_and_bbox()) {
        let restored = bbox.to_normalized(w as f64, h as f64).to_pixel(w as f64, h as f64);
        let eps = w.max(h) as f64 * 1e-9;

        for (a, b) in bbox.to_array().iter().zip(restored.to_array()) {
            prop_assert!((a - b).abs() <= eps, "{a} vs {b}");
        }
    }

    #[test]
    fn label_lines_parse_back_exactly(
        ((w, h), bbox) in arb_image_and_bbox(),
        class_id in 0usize..1000,
    ) {
        let label = NormalizedLabel {
            class_id,
            bbox: bbox.to_normalized(w as f64, h as f64),
        };
        let line = format_label_line(&label);
        let parsed = parse_label_line(&line, Path::new("x.txt"), 1)
            .expect("own output parses")
            .expect("line is not blank");

        prop_assert_eq!(parsed.class_id, class_id);
        prop_assert_eq!(parsed.bbox, label.bbox);
    }

    #[test]
    fn label_lines_have_five_tokens(((w, h), bbox) in arb_image_and_bbox()) {
        let label = NormalizedLabel {
            class_id: 3,
            bbox: bbox.to_normalized(w as f64, h as f64),
        };
        let line = format_label_line(&label);

        prop_assert_eq!(line.split(' ').count(), 5);
        prop_assert!(!line.contains('e'), "scientific notation in {line}");
    }
}

//! End-to-end render behavior through the public API.

use std::path::PathBuf;

use pretty_assertions::assert_eq;
use serde_json::{Map, Value, json};

use rotulo::{Composer, FontStore, LabelContext, Template};

fn ctx(width: u32, height: u32) -> LabelContext {
    LabelContext::fixed(width, height, PathBuf::from("/tmp/font.ttf"), 24)
}

fn render(template: Value, payload: &mut Map<String, Value>) -> Vec<u8> {
    let composer = Composer::new(FontStore::new());
    let template = Template::from_str(&template.to_string()).unwrap();
    let canvas = composer
        .render_template(&template, &ctx(300, 300), payload)
        .unwrap();
    canvas.to_png().unwrap()
}

#[test]
fn later_elements_occlude_earlier_ones() {
    // black QR then red QR at the same offset: the red one must win
    // everywhere, so the result equals rendering only the red one
    let both = render(
        json!({
            "width": 300, "height": 300,
            "elements": [
                {"type": "code", "code_type": "qr", "data": "occlusion", "fill_color": [0, 0, 0]},
                {"type": "code", "code_type": "qr", "data": "occlusion", "fill_color": [255, 0, 0]},
            ],
        }),
        &mut Map::new(),
    );
    let only_red = render(
        json!({
            "width": 300, "height": 300,
            "elements": [
                {"type": "code", "code_type": "qr", "data": "occlusion", "fill_color": [255, 0, 0]},
            ],
        }),
        &mut Map::new(),
    );
    assert_eq!(both, only_red);
}

#[test]
fn out_of_range_array_index_renders_like_an_omitted_element() {
    let with_dead_branch = render(
        json!({
            "width": 300, "height": 300,
            "elements": [
                {"type": "code", "code_type": "qr", "data": "kept"},
                {
                    "type": "data_array_index",
                    "data": ["only"],
                    "index": 7,
                    "elements": [{"type": "code", "code_type": "qr", "data": "never",
                                  "horizontal_offset": 150}],
                },
            ],
        }),
        &mut Map::new(),
    );
    let without = render(
        json!({
            "width": 300, "height": 300,
            "elements": [{"type": "code", "code_type": "qr", "data": "kept"}],
        }),
        &mut Map::new(),
    );
    assert_eq!(with_dead_branch, without);
}

#[test]
fn empty_payload_still_projects_onto_children() {
    // the child is fed the whole (empty) payload, so it encodes "{}"
    let projected = render(
        json!({
            "width": 300, "height": 300,
            "elements": [{
                "type": "from_json_payload",
                "elements": [{"type": "code", "code_type": "qr"}],
            }],
        }),
        &mut Map::new(),
    );
    let direct = render(
        json!({
            "width": 300, "height": 300,
            "elements": [{"type": "code", "code_type": "qr", "data": "{}"}],
        }),
        &mut Map::new(),
    );
    assert_eq!(projected, direct);
}

#[test]
fn payload_key_reaches_nested_elements() {
    let mut payload = Map::new();
    payload.insert("sku".into(), json!("A-1"));
    let projected = render(
        json!({
            "width": 300, "height": 300,
            "elements": [{
                "type": "from_json_payload",
                "elements": [{"type": "code", "key": "sku", "code_type": "code39"}],
            }],
        }),
        &mut payload.clone(),
    );
    let direct = render(
        json!({
            "width": 300, "height": 300,
            "elements": [{"type": "code", "data": "A-1", "code_type": "code39"}],
        }),
        &mut Map::new(),
    );
    assert_eq!(projected, direct);
}

#[test]
fn repeated_renders_are_pixel_identical() {
    let template = json!({
        "width": 300, "height": 300,
        "elements": [
            {"type": "code", "code_type": "qr", "data": "determinism"},
            {"type": "code", "data": "BARS-1", "code_type": "code128",
             "vertical_offset": 150},
        ],
    });
    let first = render(template.clone(), &mut Map::new());
    let second = render(template, &mut Map::new());
    assert_eq!(first, second);
}

#[test]
fn unknown_kinds_do_not_disturb_the_rest() {
    let with_unknown = render(
        json!({
            "width": 300, "height": 300,
            "elements": [
                {"type": "hologram", "sparkle": true},
                {"type": "code", "code_type": "qr", "data": "kept"},
            ],
        }),
        &mut Map::new(),
    );
    let without = render(
        json!({
            "width": 300, "height": 300,
            "elements": [{"type": "code", "code_type": "qr", "data": "kept"}],
        }),
        &mut Map::new(),
    );
    assert_eq!(with_unknown, without);
}

#[test]
fn text_paints_near_its_offset() {
    let font_dirs = [
        PathBuf::from("/usr/share/fonts"),
        PathBuf::from("/usr/local/share/fonts"),
        PathBuf::from("/System/Library/Fonts"),
    ];
    let fonts = FontStore::discover(&font_dirs);
    let Some((family, styles)) = fonts.families().into_iter().next() else {
        eprintln!("skipping: no system font found");
        return;
    };
    let font_path = fonts.lookup(&family, &styles[0]).unwrap().to_path_buf();

    let composer = Composer::new(FontStore::new());
    let template = Template::from_str(
        r#"{"width": 400, "height": 200, "elements": [
            {"type": "text", "data": "X", "align": "left",
             "horizontal_offset": 200, "vertical_offset": 50}]}"#,
    )
    .unwrap();
    let ctx = LabelContext::fixed(400, 200, font_path, 40);
    let canvas = composer
        .render_template(&template, &ctx, &mut Map::new())
        .unwrap();

    let mut ink_before_offset = 0;
    let mut ink_after_offset = 0;
    for y in 0..200 {
        for x in 0..400 {
            if canvas.pixel(x, y) != image::Rgb([255, 255, 255]) {
                if x < 200 { ink_before_offset += 1 } else { ink_after_offset += 1 }
            }
        }
    }
    assert_eq!(ink_before_offset, 0);
    assert!(ink_after_offset > 0);
}

#[test]
fn inject_into_payload_is_visible_to_later_branches() {
    let template = json!({
        "width": 300, "height": 300,
        "elements": [
            {"type": "inject_data", "target": "payload", "target_key": "sku",
             "data": "A-1", "elements": []},
            {"type": "code", "key": "sku", "code_type": "code39"},
        ],
    });
    let injected = render(template, &mut Map::new());
    let direct = render(
        json!({
            "width": 300, "height": 300,
            "elements": [{"type": "code", "data": "A-1", "code_type": "code39"}],
        }),
        &mut Map::new(),
    );
    assert_eq!(injected, direct);
}

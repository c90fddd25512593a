use super::*;
use crate::{
    geometry::resolve::resolve_geometry,
    layout::bar::plan_bar,
    request::model::{BarHeight, BarSpec, SnapshotParams},
};

/// One ffmpeg tokenizer pass: split on unescaped, unquoted `sep`, dropping one level of `\`
/// escapes and `'` quotes.
fn split_level(s: &str, sep: char) -> Vec<String> {
    let mut parts = vec![String::new()];
    let mut chars = s.chars();
    let mut quoted = false;
    while let Some(c) = chars.next() {
        match c {
            '\\' if !quoted => parts.last_mut().unwrap().extend(chars.next()),
            '\'' => quoted = !quoted,
            c if c == sep && !quoted => parts.push(String::new()),
            c => parts.last_mut().unwrap().push(c),
        }
    }
    parts
}

/// Value of `key` as the drawtext filter itself would see it.
fn parsed_option(chain: &str, key: &str) -> Option<String> {
    split_level(chain, ',').into_iter().find_map(|filter| {
        let args = filter.strip_prefix("drawtext=")?.to_owned();
        split_level(&args, ':')
            .into_iter()
            .find_map(|kv| kv.strip_prefix(&format!("{key}=")).map(str::to_owned))
    })
}

#[test]
fn accented_letters_become_code_point_escapes() {
    assert_eq!(escape_drawtext("Grüße"), r"Gr\u00fc\u00dfe");
    assert_eq!(escape_drawtext("Ça"), r"\u00c7a");
    assert_eq!(escape_drawtext("12:30, 5% it's"), "12:30, 5% it's");
}

#[test]
fn filter_values_are_escaped_for_both_parser_levels() {
    assert_eq!(quote_filter_value("12:30"), r"12\\:30");
    assert_eq!(quote_filter_value("it's"), r"it\\\'s");
    assert_eq!(quote_filter_value("a,b;[c]"), r"a\,b\;\[c\]");
    assert_eq!(quote_filter_value("50%"), "50%");
    assert_eq!(quote_filter_value(r"a\b"), r"a\\\\b");
}

#[test]
fn drawtext_label_survives_filtergraph_parsing() {
    let label = r"Cam 1, 12:30 50% it's [Grüße] a\b;";
    let stage = FilterStage::DrawText {
        font_file: Some(PathBuf::from("/fonts/it's: a,b.ttf")),
        text: label.to_owned(),
        size: 20,
        color: "black".to_owned(),
        x: "10".to_owned(),
        y: "0".to_owned(),
    };
    let mut chain = FilterChain::default();
    chain.push(FilterStage::EvenSize);
    chain.push(stage);
    let rendered = chain.to_string();

    assert_eq!(split_level(&rendered, ',').len(), 2, "{rendered}");
    assert_eq!(parsed_option(&rendered, "text"), Some(escape_drawtext(label)));
    assert_eq!(
        parsed_option(&rendered, "fontfile").as_deref(),
        Some("/fonts/it's: a,b.ttf")
    );
    assert_eq!(parsed_option(&rendered, "expansion").as_deref(), Some("none"));
    assert_eq!(parsed_option(&rendered, "fontsize").as_deref(), Some("20"));
}

#[test]
fn stages_render_in_ffmpeg_syntax() {
    let rotate = FilterStage::Rotate {
        radians: std::f64::consts::FRAC_PI_2,
        size: Some(Resolution::new(200, 100)),
        fill: "black".to_owned(),
    };
    assert_eq!(rotate.to_string(), "rotate=a=1.570796:ow=200:oh=100:c=black");

    let crop = FilterStage::Crop(CropRect {
        x: 1,
        y: 2,
        width: 30,
        height: 40,
    });
    assert_eq!(crop.to_string(), "crop=30:40:1:2");

    let bar = FilterStage::DrawBox {
        position: BarPosition::Bottom,
        height: 40,
        color: "0x102030".to_owned(),
    };
    assert_eq!(bar.to_string(), "drawbox=x=0:y=ih-40:w=iw:h=40:color=0x102030:t=fill");
}

#[test]
fn unknown_source_leaves_bounds_to_encoder() {
    let mut params = SnapshotParams::new("clip.mp4");
    params.rotate_angle = 30;
    let geometry = resolve_geometry(None, &params).unwrap();
    let plan = build_filter_chain(None, &geometry, None, "black", &BarFont::Builtin).unwrap();
    assert_eq!(plan.final_resolution, None);
    assert_eq!(
        plan.chain.to_string(),
        "rotate=a=0.523599:ow=rotw(a):oh=roth(a):c=black,scale=trunc(iw/2)*2:trunc(ih/2)*2"
    );
}

#[test]
fn full_chain_mirrors_still_semantics() {
    let mut params = SnapshotParams::new("clip.mp4");
    params.rotate_angle = 90;
    params.crop = Some(vec![0, 0, 640, 360]);
    let spec = BarSpec {
        height: Some(BarHeight::parse("10%")),
        bar_color: "rgb(255,255,255)".to_owned(),
        text_left: "Front door".to_owned(),
        text_right: "12:00".to_owned(),
        ..BarSpec::default()
    };
    let source = Some(Resolution::new(720, 1280));
    let geometry = resolve_geometry(source, &params).unwrap();
    let (bar, warnings) = plan_bar(&spec, geometry.output().map(|r| r.height), 40);
    assert!(warnings.is_empty());
    assert_eq!(bar.height_px, 36);

    let plan = build_filter_chain(source, &geometry, Some(&bar), "black", &BarFont::Builtin)
        .unwrap();
    assert_eq!(plan.final_resolution, Some(Resolution::new(640, 360)));

    let stages = plan.chain.stages();
    assert_eq!(stages.len(), 5);
    assert!(matches!(stages[0], FilterStage::Rotate { size: Some(s), .. } if s == Resolution::new(1280, 720)));
    assert_eq!(stages[1].to_string(), "crop=640:360:0:0");
    assert_eq!(stages[2].to_string(), "drawbox=x=0:y=ih-36:w=iw:h=36:color=0xFFFFFF:t=fill");
    assert_eq!(
        stages[3].to_string(),
        "drawtext=expansion=none:text=Front door:fontsize=18:fontcolor=black:x=10:y=h-36+(36-th)/2"
    );
    assert_eq!(
        stages[4].to_string(),
        r"drawtext=expansion=none:text=12\\:00:fontsize=18:fontcolor=black:x=w-tw-10:y=h-36+(36-th)/2"
    );
}

#[test]
fn outline_font_is_passed_as_fontfile() {
    let font = BarFont::Outline {
        path: PathBuf::from("/fonts/My Font.ttf"),
        bytes: std::sync::Arc::new(Vec::new()),
    };
    let mut backend = FilterGraphBackend::new(Some(Resolution::new(100, 100)), "black", &font);
    let spec = BarSpec {
        text_middle: "x".to_owned(),
        ..BarSpec::default()
    };
    let (bar, _) = plan_bar(&spec, Some(100), 20);
    let chain = backend.overlay_bar(FilterChain::default(), &bar).unwrap();
    assert!(chain.to_string().contains("drawtext=expansion=none:fontfile=/fonts/My Font.ttf:text=x"));
}

#[test]
fn odd_output_is_rounded_to_even() {
    let mut params = SnapshotParams::new("clip.mp4");
    params.crop = Some(vec![0, 0, 101, 51]);
    let source = Some(Resolution::new(200, 100));
    let geometry = resolve_geometry(source, &params).unwrap();
    let plan = build_filter_chain(source, &geometry, None, "black", &BarFont::Builtin).unwrap();
    assert_eq!(plan.final_resolution, Some(Resolution::new(100, 50)));
    assert_eq!(plan.chain.stages().last(), Some(&FilterStage::EvenSize));
}

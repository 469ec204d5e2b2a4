use crossterm::style::Color as Ct;

use test_board::color::{Color, ColorDepth};
use test_board::config::types::AppConfig;
use test_board::theme::{Background, ResolvedTheme};
use test_board::types::RowState;

fn is_base16(c: Ct) -> bool {
    !matches!(c, Ct::Rgb { .. } | Ct::AnsiValue(_) | Ct::Reset)
}

#[test]
fn parse_hex_6_digit() {
    let c = Color::parse("#c0caf5", "test_field").unwrap();
    assert_eq!(
        c,
        Color::Hex {
            r: 0xc0,
            g: 0xca,
            b: 0xf5
        }
    );
}

#[test]
fn parse_hex_3_digit() {
    // #f0a → r=0xff, g=0x00, b=0xaa
    let c = Color::parse("#f0a", "test_field").unwrap();
    assert_eq!(
        c,
        Color::Hex {
            r: 0xff,
            g: 0x00,
            b: 0xaa
        }
    );
}

#[test]
fn parse_ansi256_bounds() {
    assert_eq!(Color::parse("0", "f").unwrap(), Color::Ansi256(0));
    assert_eq!(Color::parse("255", "f").unwrap(), Color::Ansi256(255));
    assert_eq!(Color::parse(" 007 ", "f").unwrap(), Color::Ansi256(7));
}

#[test]
fn parse_errors_name_field_and_value() {
    let err = Color::parse("256", "background.checked").unwrap_err();
    assert!(err.to_string().contains("background.checked"));
    assert!(err.to_string().contains("256"));

    for bad in ["foobar", "#ab", "#gggggg", "#ééé"] {
        let err = Color::parse(bad, "state.failed").unwrap_err();
        assert!(err.to_string().contains("state.failed"), "{bad}: {err}");
    }
}

#[test]
fn from_str_and_display_agree() {
    let c: Color = "#c0caf5".parse().unwrap();
    assert_eq!(c.to_string(), "#c0caf5");
    assert_eq!(Color::Ansi256(42).to_string(), "42");
}

// ---------------------------------------------------------------------------
// Depth conversion
// ---------------------------------------------------------------------------

#[test]
fn truecolor_keeps_hex_and_index() {
    let c = Color::Hex {
        r: 0xc0,
        g: 0xca,
        b: 0xf5,
    };
    assert_eq!(
        c.to_crossterm_color(ColorDepth::TrueColor),
        Ct::Rgb {
            r: 0xc0,
            g: 0xca,
            b: 0xf5
        }
    );
    assert_eq!(
        Color::Ansi256(42).to_crossterm_color(ColorDepth::TrueColor),
        Ct::AnsiValue(42)
    );
}

#[test]
fn low_indices_use_terminal_palette() {
    assert_eq!(Color::Ansi256(1).to_crossterm_color(ColorDepth::TrueColor), Ct::DarkRed);
    assert_eq!(Color::Ansi256(15).to_crossterm_color(ColorDepth::Color16), Ct::White);
}

#[test]
fn color256_approximates_hex() {
    let red = Color::Hex { r: 255, g: 0, b: 0 };
    assert_eq!(red.to_crossterm_color(ColorDepth::Color256), Ct::AnsiValue(196));

    let grey = Color::Hex {
        r: 128,
        g: 128,
        b: 128,
    };
    assert_eq!(grey.to_crossterm_color(ColorDepth::Color256), Ct::AnsiValue(244));
}

#[test]
fn color16_degrades_reasonably() {
    let cases = [
        (Color::Hex { r: 255, g: 0, b: 0 }, [Ct::DarkRed, Ct::Red]),
        (Color::Hex { r: 0, g: 255, b: 0 }, [Ct::DarkGreen, Ct::Green]),
        (Color::Hex { r: 0, g: 0, b: 255 }, [Ct::DarkBlue, Ct::Blue]),
        (
            Color::Hex {
                r: 255,
                g: 255,
                b: 255,
            },
            [Ct::Grey, Ct::White],
        ),
        (Color::Ansi256(196), [Ct::DarkRed, Ct::Red]),
        (Color::Ansi256(46), [Ct::DarkGreen, Ct::Green]),
    ];
    for (color, expected) in cases {
        let got = color.to_crossterm_color(ColorDepth::Color16);
        assert!(expected.contains(&got), "{color} degraded to {got:?}");
    }
}

// ---------------------------------------------------------------------------
// Theme resolution
// ---------------------------------------------------------------------------

#[test]
fn empty_theme_resolves_to_background_defaults() {
    let config = AppConfig::default();
    let dark = ResolvedTheme::resolve(&config.theme, Background::Dark);
    let light = ResolvedTheme::resolve(&config.theme, Background::Light);
    assert_ne!(dark.text_primary, light.text_primary);
    assert_ne!(dark.bg_selected, dark.bg_checked);
}

#[test]
fn state_colors_fall_back_to_text_slots() {
    let toml = r##"
[theme.colors.text]
error = "#ff0000"
success = 2

[theme.colors.state]
running = "3"
"##;
    let config: AppConfig = toml::from_str(toml).unwrap();
    let theme = ResolvedTheme::resolve(&config.theme, Background::Dark);
    assert_eq!(theme.state_failed, Color::Hex { r: 255, g: 0, b: 0 });
    assert_eq!(theme.state_passed, Color::Ansi256(2));
    assert_eq!(theme.state_running, Color::Ansi256(3));
    assert_eq!(theme.state_color(&RowState::Failed), theme.state_failed);
    assert_eq!(
        theme.state_color(&RowState::Other("skipped".to_owned())),
        theme.text_secondary
    );
}

#[test]
fn full_theme_degrades_to_16_without_panic() {
    let theme = ResolvedTheme::resolve(&AppConfig::default().theme, Background::Light);
    let all_colors = [
        theme.text_primary,
        theme.text_secondary,
        theme.text_inverted,
        theme.text_faint,
        theme.text_warning,
        theme.text_success,
        theme.text_error,
        theme.bg_selected,
        theme.bg_checked,
        theme.border_primary,
        theme.border_faint,
        theme.state_enqueued,
        theme.state_running,
        theme.state_passed,
        theme.state_failed,
    ];
    for color in all_colors {
        let got = color.to_crossterm_color(ColorDepth::Color16);
        assert!(is_base16(got), "{color} should degrade to 16 colors, got {got:?}");
    }
}

//! Builtin functions and the list of functions CSS itself understands.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use crate::color::Color;
use crate::expr::{evaluate_number, format_number};
use crate::{Error, Result};

/// Signature shared by all builtin functions.
pub type Builtin = fn(&[String]) -> Result<String>;

static BUILTINS: LazyLock<HashMap<&'static str, Builtin>> = LazyLock::new(|| {
    let table: [(&'static str, Builtin); 11] = [
        ("ceil", ceil),
        ("floor", floor),
        ("round", round),
        ("lighten", lighten),
        ("darken", darken),
        ("hsb", hsb),
        ("mix", mix),
        ("mixBlack", mix_black),
        ("mixWhite", mix_white),
        ("ieGradient", ie_gradient),
        ("transparentize", transparentize),
    ];
    table.into_iter().collect()
});

/// Functions passed through to the output untouched (besides resolving calls
/// in their arguments). Matched case-insensitively against the last
/// name segment, so `progid:DXImageTransform.Microsoft.gradient(...)` is
/// recognized by its `gradient` suffix.
static NATIVE_FUNCTIONS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        // values
        "url", "attr", "calc", "var", "env", "min", "max", "clamp", "counter", "counters",
        "format", "local", "image-set", "element", "cubic-bezier", "steps",
        // colors
        "rgb", "rgba", "hsl", "hsla", "hwb", "lab", "lch", "color", "alpha",
        // gradients
        "linear-gradient", "radial-gradient", "conic-gradient", "repeating-linear-gradient",
        "repeating-radial-gradient", "-webkit-gradient", "-webkit-linear-gradient",
        "-webkit-radial-gradient", "-moz-linear-gradient", "-moz-radial-gradient",
        "-o-linear-gradient", "-ms-linear-gradient", "gradient", "color-stop", "from", "to",
        "shadow",
        // transforms
        "matrix", "matrix3d", "translate", "translatex", "translatey", "translatez",
        "translate3d", "scale", "scalex", "scaley", "scalez", "scale3d", "rotate", "rotatex",
        "rotatey", "rotatez", "rotate3d", "skew", "skewx", "skewy", "perspective",
        // filters
        "blur", "brightness", "contrast", "drop-shadow", "grayscale", "hue-rotate", "invert",
        "opacity", "saturate", "sepia",
    ]
    .into_iter()
    .collect()
});

/// Look up a builtin function by its exact name.
pub fn builtin(name: &str) -> Option<Builtin> {
    BUILTINS.get(name).copied()
}

/// Whether `name` is a function CSS understands natively.
pub fn is_native(name: &str) -> bool {
    NATIVE_FUNCTIONS.contains(name.to_ascii_lowercase().as_str())
}

fn expect_args<'a, const N: usize>(function: &str, args: &'a [String]) -> Result<[&'a str; N]> {
    let found: Vec<&str> = args.iter().map(String::as_str).collect();
    found.try_into().map_err(|found: Vec<&str>| {
        Error::invalid_arguments(
            function,
            format!("expected {} argument(s), {} given", N, found.len()),
        )
    })
}

fn number(function: &str, text: &str) -> Result<f64> {
    text.trim()
        .parse::<f64>()
        .map_err(|_| Error::invalid_arguments(function, format!("'{}' is not a number", text)))
}

/// `10%` and `10` both mean ten percent.
fn percent(function: &str, text: &str) -> Result<f64> {
    number(function, text.trim().trim_end_matches('%'))
}

/// Evaluate arithmetic in `value`, round it with `op`, and keep a `px` unit.
fn rounding(function: &str, args: &[String], op: fn(f64) -> f64) -> Result<String> {
    let [value] = expect_args::<1>(function, args)?;
    let unit = if value.contains("px") { "px" } else { "" };
    let result = evaluate_number(&value.replace("px", ""))
        .map_err(|e| Error::invalid_arguments(function, e.to_string()))?;
    Ok(format!("{}{}", format_number(op(result)), unit))
}

fn ceil(args: &[String]) -> Result<String> {
    rounding("ceil", args, f64::ceil)
}

fn floor(args: &[String]) -> Result<String> {
    rounding("floor", args, f64::floor)
}

fn round(args: &[String]) -> Result<String> {
    rounding("round", args, f64::round)
}

fn shift(function: &str, args: &[String], sign: f64) -> Result<String> {
    let [value, amount] = expect_args::<2>(function, args)?;
    let mut color = Color::parse(value)?;
    color.add(sign * 255.0 * percent(function, amount)? / 100.0);
    Ok(color.to_hex())
}

fn lighten(args: &[String]) -> Result<String> {
    shift("lighten", args, 1.0)
}

fn darken(args: &[String]) -> Result<String> {
    shift("darken", args, -1.0)
}

fn hsb(args: &[String]) -> Result<String> {
    let [hue, saturation, brightness] = expect_args::<3>("hsb", args)?;
    let hue = number("hsb", hue.trim().trim_end_matches("deg"))?;
    Ok(Color::from_hsb(hue, percent("hsb", saturation)?, percent("hsb", brightness)?).to_hex())
}

fn blend(function: &str, background: &str, over: &str, amount: &str) -> Result<String> {
    let mut background = Color::parse(background)?;
    let over = Color::parse(over)?;
    background.mix_with(&over, percent(function, amount)? / 100.0);
    Ok(background.to_hex())
}

fn mix(args: &[String]) -> Result<String> {
    let [background, over, amount] = expect_args::<3>("mix", args)?;
    blend("mix", background, over, amount)
}

fn mix_black(args: &[String]) -> Result<String> {
    let [background, amount] = expect_args::<2>("mixBlack", args)?;
    blend("mixBlack", background, "#000000", amount)
}

fn mix_white(args: &[String]) -> Result<String> {
    let [background, amount] = expect_args::<2>("mixWhite", args)?;
    blend("mixWhite", background, "#ffffff", amount)
}

fn ie_gradient(args: &[String]) -> Result<String> {
    let [opacity] = expect_args::<1>("ieGradient", args)?;
    let opacity = number("ieGradient", opacity)?;
    Ok(format!(
        "progid:DXImageTransform.Microsoft.Alpha(Opacity={})",
        format_number((opacity * 100.0).round())
    ))
}

fn transparentize(args: &[String]) -> Result<String> {
    let [value, amount] = expect_args::<2>("transparentize", args)?;
    let mut color = Color::parse(value)?;
    let amount = match amount.trim().strip_suffix('%') {
        Some(pct) => number("transparentize", pct)? / 100.0,
        None => number("transparentize", amount)?,
    };
    color.set_alpha(color.alpha() - amount);
    Ok(color.to_rgba())
}

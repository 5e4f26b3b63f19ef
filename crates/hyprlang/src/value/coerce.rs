//! Text to payload coercion.
//!
//! Error strings name the offending text; they become the message of a
//! [`LineError::Coercion`](crate::LineError::Coercion).

use super::Vec2;

/// Parses the textual forms accepted by integer cells.
///
/// Besides decimal integers this understands:
///
/// - `0x` prefixed hex, taken literally
/// - `rgba(r, g, b, a)` with integer channels and a `0..=1` alpha, and
///   `rgba(RRGGBBAA)`; both packed as `0xAARRGGBB`
/// - `rgb(r, g, b)` and `rgb(RRGGBB)`, packed with an opaque alpha
/// - `true`/`on`/`yes` as `1` and `false`/`off`/`no` as `0` (prefix match)
pub fn parse_int(text: &str) -> Result<i64, String> {
	if text.starts_with("0x") {
		return parse_hex(text);
	}

	if let Some(inner) = function_args(text, "rgba(") {
		return parse_rgba(inner);
	}

	if let Some(inner) = function_args(text, "rgb(") {
		return parse_rgb(inner);
	}

	if ["true", "on", "yes"].iter().any(|p| text.starts_with(p)) {
		return Ok(1);
	}

	if ["false", "off", "no"].iter().any(|p| text.starts_with(p)) {
		return Ok(0);
	}

	if !is_integer(text) {
		return Err(format!("cannot parse \"{text}\" as an int."));
	}

	text.parse::<i64>()
		.map_err(|e| format!("cannot parse \"{text}\" as an int: {e}"))
}

pub fn parse_float(text: &str) -> Result<f32, String> {
	text.trim()
		.parse::<f32>()
		.map_err(|e| format!("failed parsing a float: {e} (\"{text}\")"))
}

/// Parses exactly two floats separated by a single space.
pub fn parse_vec2(text: &str) -> Result<Vec2, String> {
	let Some((x, y)) = text.split_once(' ') else {
		return Err(format!("failed parsing a vec2: no space in \"{text}\""));
	};

	if x.contains(' ') || y.contains(' ') {
		return Err(format!("failed parsing a vec2: too many args in \"{text}\""));
	}

	let component = |s: &str| {
		s.parse::<f32>()
			.map_err(|e| format!("failed parsing a vec2: {e} (\"{s}\")"))
	};

	Ok(Vec2::new(component(x)?, component(y)?))
}

fn function_args<'a>(text: &'a str, open: &str) -> Option<&'a str> {
	text.strip_prefix(open)?.strip_suffix(')').map(str::trim)
}

fn parse_hex(text: &str) -> Result<i64, String> {
	let digits = text.strip_prefix("0x").unwrap_or(text);
	if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
		return Err(format!("invalid hex {text}"));
	}
	i64::from_str_radix(digits, 16).map_err(|_| format!("invalid hex {text}"))
}

fn parse_rgba(inner: &str) -> Result<i64, String> {
	if inner.matches(',').count() == 3 {
		let parts: Vec<&str> = inner.split(',').map(str::trim).collect();
		let failed = || format!("failed parsing {inner}");

		let r = parse_int(parts[0]).map_err(|_| failed())?;
		let g = parse_int(parts[1]).map_err(|_| failed())?;
		let b = parse_int(parts[2]).map_err(|_| failed())?;
		let alpha = parts[3].parse::<f32>().map_err(|_| failed())?;
		let a = (alpha * 255.0).round() as u8;

		return Ok(pack_argb(i64::from(a), r, g, b));
	}

	if inner.len() == 8 {
		let rgba = parse_hex(inner)?;
		return Ok(rgba_to_argb(rgba));
	}

	Err("rgba() expects length of 8 characters (4 bytes) or 4 comma separated values".into())
}

fn parse_rgb(inner: &str) -> Result<i64, String> {
	if inner.matches(',').count() == 2 {
		let parts: Vec<&str> = inner.split(',').map(str::trim).collect();
		let failed = || format!("failed parsing {inner}");

		let r = parse_int(parts[0]).map_err(|_| failed())?;
		let g = parse_int(parts[1]).map_err(|_| failed())?;
		let b = parse_int(parts[2]).map_err(|_| failed())?;

		return Ok(pack_argb(0xFF, r, g, b));
	}

	if inner.len() == 6 {
		return Ok(parse_hex(inner)? + 0xFF00_0000);
	}

	Err("rgb() expects length of 6 characters (3 bytes) or 3 comma separated values".into())
}

/// Channels are not range checked; out of range values bleed into their
/// neighbours the same way plain addition would.
fn pack_argb(a: i64, r: i64, g: i64, b: i64) -> i64 {
	a.wrapping_mul(0x100_0000)
		.wrapping_add(r.wrapping_mul(0x1_0000))
		.wrapping_add(g.wrapping_mul(0x100))
		.wrapping_add(b)
}

/// Moves the alpha byte of a packed `0xRRGGBBAA` to the top: `0xAARRGGBB`.
pub(crate) fn rgba_to_argb(rgba: i64) -> i64 {
	(rgba >> 8) + 0x100_0000 * (rgba & 0xFF)
}

/// An optional leading `-` followed by one or more ASCII digits.
fn is_integer(text: &str) -> bool {
	let digits = text.strip_prefix('-').unwrap_or(text);
	!digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

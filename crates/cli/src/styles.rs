//! Help output colours.

use clap::builder::Styles;
use clap::builder::styling::AnsiColor;

/// Green bold headings, cyan literals and placeholders, as cargo does.
pub fn cli_styles() -> Styles {
	Styles::styled()
		.header(AnsiColor::Green.on_default().bold())
		.usage(AnsiColor::Green.on_default().bold())
		.literal(AnsiColor::Cyan.on_default())
		.placeholder(AnsiColor::Cyan.on_default())
		.valid(AnsiColor::Cyan.on_default())
}

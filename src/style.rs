// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Registry of named terminal styles.

/// Named terminal style: a pair of ANSI SGR sequences wrapping the text.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Style {
    /// Name the style is looked up by in templates.
    pub name: &'static str,

    /// Sequence starting the style.
    pub open: &'static str,

    /// Sequence ending the style.
    pub close: &'static str,
}

macro_rules! styles {
    ($($name:literal => $open:literal, $close:literal;)*) => {
        /// All the [`Style`]s available in templates, both for the
        /// `{name:style}` placeholders and for the `colors` namespace of
        /// expressions.
        pub static STYLES: &[Style] = &[$(
            Style {
                name: $name,
                open: concat!("\x1b[", $open, "m"),
                close: concat!("\x1b[", $close, "m"),
            },
        )*];
    };
}

styles! {
    "reset" => "0", "0";
    "bold" => "1", "22";
    "dim" => "2", "22";
    "italic" => "3", "23";
    "underline" => "4", "24";
    "overline" => "53", "55";
    "inverse" => "7", "27";
    "hidden" => "8", "28";
    "strikethrough" => "9", "29";

    "black" => "30", "39";
    "red" => "31", "39";
    "green" => "32", "39";
    "yellow" => "33", "39";
    "blue" => "34", "39";
    "magenta" => "35", "39";
    "cyan" => "36", "39";
    "white" => "37", "39";
    "gray" => "90", "39";
    "grey" => "90", "39";

    "bgBlack" => "40", "49";
    "bgRed" => "41", "49";
    "bgGreen" => "42", "49";
    "bgYellow" => "43", "49";
    "bgBlue" => "44", "49";
    "bgMagenta" => "45", "49";
    "bgCyan" => "46", "49";
    "bgWhite" => "47", "49";
    "bgGray" => "100", "49";

    "redBright" => "91", "39";
    "greenBright" => "92", "39";
    "yellowBright" => "93", "39";
    "blueBright" => "94", "39";
    "magentaBright" => "95", "39";
    "cyanBright" => "96", "39";
    "whiteBright" => "97", "39";

    "bgRedBright" => "101", "49";
    "bgGreenBright" => "102", "49";
    "bgYellowBright" => "103", "49";
    "bgBlueBright" => "104", "49";
    "bgMagentaBright" => "105", "49";
    "bgCyanBright" => "106", "49";
    "bgWhiteBright" => "107", "49";
}

/// Looks up a [`Style`] by its `name`.
#[must_use]
pub fn lookup(name: &str) -> Option<&'static Style> {
    STYLES.iter().find(|s| s.name == name)
}

impl Style {
    /// Wraps the given `input` into this [`Style`].
    ///
    /// Any occurrence of this [`Style::close`] sequence inside `input` (left
    /// by a nested style sharing it) re-opens this [`Style`], so the text
    /// following the nested part keeps being styled.
    #[must_use]
    pub fn paint(&self, input: &str) -> String {
        let mut out = String::with_capacity(
            input.len() + self.open.len() + self.close.len(),
        );
        out.push_str(self.open);
        if self.open == self.close {
            out.push_str(input);
        } else {
            let mut rest = input;
            while let Some(at) = rest.find(self.close) {
                out.push_str(&rest[..at]);
                out.push_str(self.open);
                rest = &rest[at + self.close.len()..];
            }
            out.push_str(rest);
        }
        out.push_str(self.close);
        out
    }
}

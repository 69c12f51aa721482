//
// Copyright 2020 bplist Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

use crate::document::HEADER_MAGIC_NUMBER;

/// The concrete syntax of a property list document.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Format {
    /// `bplist` followed by a two-digit version.
    Binary,
    /// An XML document starting with `<?xml `.
    Xml,
    /// The plain-text syntax. Anything which is neither binary nor XML.
    Ascii,
}

impl Format {
    /// Identifies the format of a document from its first bytes.
    pub fn detect(input: &[u8]) -> Format {
        let magic = HEADER_MAGIC_NUMBER.len();
        let is_binary = input.starts_with(HEADER_MAGIC_NUMBER)
            && input.len() >= magic + 2
            && input[magic .. magic + 2].iter().all(u8::is_ascii_digit);

        if is_binary {
            Format::Binary
        } else if input.starts_with(b"<?xml ") {
            Format::Xml
        } else {
            Format::Ascii
        }
    }
}

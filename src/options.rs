//
// Copyright 2020 bplist Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

/// The default limit on collection nesting.
pub const DEFAULT_MAX_DEPTH: usize = 512;

/// Objects a decoder may produce per byte of input when no explicit limit is set.
pub const DEFAULT_OBJECTS_PER_BYTE: usize = 16;

/// Settings shared by the encoder and decoder.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct Options {
    /// Maximum number of collections which may be nested inside one another.
    pub max_depth: usize,
    /// Maximum number of objects a decoder may produce, counting every visit
    /// to an object referenced more than once. `None` scales the limit with
    /// the length of the input. Not used when encoding.
    pub max_objects: Option<usize>,
}

impl Options {
    /// Sets the maximum collection nesting depth.
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Sets the maximum number of decoded objects.
    pub fn max_objects(mut self, max_objects: usize) -> Self {
        self.max_objects = Some(max_objects);
        self
    }

    /// The decoded object limit for an input of the given length.
    pub(crate) fn object_limit(&self, input_length: usize) -> usize {
        self.max_objects
            .unwrap_or_else(|| input_length.saturating_mul(DEFAULT_OBJECTS_PER_BYTE))
    }
}

impl Default for Options {
    fn default() -> Self {
        Options {
            max_depth: DEFAULT_MAX_DEPTH,
            max_objects: None,
        }
    }
}

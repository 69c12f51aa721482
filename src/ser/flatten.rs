//
// Copyright 2020 bplist Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

//! Linearizes a value tree into the list of objects written to the object table.
//!
//! Objects are numbered in pre-order: a collection precedes its children, and the
//! keys of a dictionary all precede its values. Equal values are not shared, so
//! every node in the tree is written exactly once.

use crate::document::ObjectFormat;
use crate::error::{Error, Result};
use crate::value::{Dictionary, Value};

/// A single entry in the object table.
#[derive(Clone, PartialEq, Debug)]
pub enum FlatObject<'a> {
    /// A scalar, written directly from the value.
    Scalar(&'a Value),
    /// A dictionary key.
    Key(&'a str),
    /// A collection and the ids of its children.
    Collection {
        format: ObjectFormat,
        /// Elements in the collection, or entries in a dictionary.
        count: usize,
        /// For a dictionary, all key ids followed by all value ids.
        references: Vec<usize>,
    },
}

/// The result of flattening a value tree.
#[derive(Debug)]
pub struct Flattened<'a> {
    /// Objects in id order. The root is always object 0.
    pub objects: Vec<FlatObject<'a>>,
    /// Whether any object may only appear in a version 10 document.
    pub extended: bool,
}

/// Flattens the tree rooted at the value, failing if collections are nested
/// more than `max_depth` deep.
pub fn flatten(root: &Value, max_depth: usize) -> Result<Flattened<'_>> {
    let mut flattener = Flattener {
        objects: Vec::new(),
        extended: false,
        depth: 0,
        max_depth,
    };
    flattener.flatten(root)?;
    Ok(Flattened {
        objects: flattener.objects,
        extended: flattener.extended,
    })
}

struct Flattener<'a> {
    objects: Vec<FlatObject<'a>>,
    extended: bool,
    depth: usize,
    max_depth: usize,
}

impl<'a> Flattener<'a> {

    /// Assigns the next id to the value and flattens its children, returning the id.
    fn flatten(&mut self, value: &'a Value) -> Result<usize> {
        let id = self.objects.len();
        match value {
            Value::Array(elements) =>
                self.flatten_collection(ObjectFormat::Array, elements.iter())?,
            Value::OrderedSet(elements) =>
                self.flatten_collection(ObjectFormat::OrderedSet, elements.iter())?,
            Value::Set(elements) =>
                self.flatten_collection(ObjectFormat::Set, elements.iter())?,
            Value::Dictionary(dictionary) =>
                self.flatten_dictionary(dictionary)?,
            _ =>
                self.objects.push(FlatObject::Scalar(value)),
        }

        match value {
            Value::Null | Value::Set(_) | Value::OrderedSet(_) | Value::Url(_) | Value::Uuid(_) =>
                self.extended = true,
            _ => {}
        }

        Ok(id)
    }

    /// Reserves the id of a collection before any of its children are numbered.
    fn enter_collection(&mut self, format: ObjectFormat) -> Result<usize> {
        if self.depth >= self.max_depth {
            return Err(Error::RecursionLimitExceeded { limit: self.max_depth });
        }
        self.depth += 1;

        let id = self.objects.len();
        self.objects.push(FlatObject::Collection {
            format,
            count: 0,
            references: Vec::new(),
        });
        Ok(id)
    }

    fn exit_collection(&mut self, id: usize, format: ObjectFormat, count: usize, references: Vec<usize>) {
        self.depth -= 1;
        self.objects[id] = FlatObject::Collection { format, count, references };
    }

    fn flatten_collection<I>(&mut self, format: ObjectFormat, elements: I) -> Result<()>
    where
        I: Iterator<Item = &'a Value>,
    {
        let id = self.enter_collection(format)?;
        let references = elements
            .map(|element| self.flatten(element))
            .collect::<Result<Vec<usize>>>()?;
        self.exit_collection(id, format, references.len(), references);
        Ok(())
    }

    fn flatten_dictionary(&mut self, dictionary: &'a Dictionary) -> Result<()> {
        let id = self.enter_collection(ObjectFormat::Dictionary)?;

        let mut references = Vec::with_capacity(dictionary.len() * 2);
        for key in dictionary.keys() {
            references.push(self.objects.len());
            self.objects.push(FlatObject::Key(key.as_str()));
        }
        for value in dictionary.values() {
            references.push(self.flatten(value)?);
        }

        self.exit_collection(id, ObjectFormat::Dictionary, dictionary.len(), references);
        Ok(())
    }

}

//! Serialization traits.
//!
//! `GerberCode` renders a complete, self-terminated line or block.
//! `PartialGerberCode` renders a fragment that the caller embeds into a
//! larger line (e.g. the body of a `G04` comment, or the `X`/`Y` part of
//! an operation).

use std::io::Write;

use crate::errors::GerberResult;

pub trait GerberCode<W: Write> {
    fn serialize(&self, writer: &mut W) -> GerberResult<()>;
}

pub trait PartialGerberCode<W: Write> {
    fn serialize_partial(&self, writer: &mut W) -> GerberResult<()>;
}

impl<W: Write, T: PartialGerberCode<W>> PartialGerberCode<W> for Option<T> {
    fn serialize_partial(&self, writer: &mut W) -> GerberResult<()> {
        if let Some(inner) = self {
            inner.serialize_partial(writer)?;
        }
        Ok(())
    }
}

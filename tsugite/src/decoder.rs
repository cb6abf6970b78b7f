//! Conversion traits linking the compilation pipeline stages.
//!
//! Each stage of the pipeline (source text, parsed [`Schema`],
//! compiled [`Specification`]) converts into the next through the
//! [`Decoder`] trait; the [`DecodableFrom`] marker pins down which
//! conversions exist so an invalid chain fails to compile.
//!
//! [`Schema`]: schema::Schema
//! [`Specification`]: crate::Specification

/// Converts one pipeline representation into the next.
pub trait Decoder<T, D: DecodableFrom<T>> {
    type Error;

    fn decode(&self) -> Result<D, Self::Error>;
}

/// Marker trait: the implementing type can be produced by decoding a
/// `T`.
pub trait DecodableFrom<T> {}

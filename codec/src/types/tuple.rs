//! Implementations of Codec for tuples.
//!
//! A tuple is encoded like a struct with the same field types.

use crate::{
    layout::{Layout, Plan},
    Describe, EncodeSize, Error, Field, Read, Schema, Write,
};
use bytes::{Buf, BufMut};
use paste::paste;

macro_rules! impl_codec_for_tuple {
    ($($index:literal),*) => {
        paste! {
            impl<$( [<T $index>]: Describe ),*> Describe for ( $( [<T $index>], )* ) {
                const SCHEMA: &'static Schema = &Schema::Struct {
                    fields: &[ $( Field { name: stringify!($index), schema: [<T $index>]::SCHEMA }, )* ],
                };
            }

            impl<$( [<T $index>]: EncodeSize ),*> EncodeSize for ( $( [<T $index>], )* ) {
                #[inline]
                fn scan(&self, plan: &mut Plan) {
                    $( self.$index.scan(plan); )*
                }

                #[inline]
                fn encode_size(&self, layout: &Layout) -> usize {
                    0 $( + self.$index.encode_size(layout) )*
                }
            }

            impl<$( [<T $index>]: Write ),*> Write for ( $( [<T $index>], )* ) {
                #[inline]
                fn write(&self, buf: &mut impl BufMut, layout: &Layout) {
                    $( self.$index.write(buf, layout); )*
                }
            }

            impl<$( [<T $index>]: Read ),*> Read for ( $( [<T $index>], )* ) {
                #[inline]
                fn read_cfg(buf: &mut impl Buf, layout: &Layout) -> Result<Self, Error> {
                    Ok(( $( [<T $index>]::read_cfg(buf, layout)?, )* ))
                }

                #[inline]
                fn read_into(&mut self, buf: &mut impl Buf, layout: &Layout) -> Result<(), Error> {
                    $( self.$index.read_into(buf, layout)?; )*
                    Ok(())
                }
            }
        }
    };
}

// Generate implementations for tuple sizes 1 through 12
impl_codec_for_tuple!(0);
impl_codec_for_tuple!(0, 1);
impl_codec_for_tuple!(0, 1, 2);
impl_codec_for_tuple!(0, 1, 2, 3);
impl_codec_for_tuple!(0, 1, 2, 3, 4);
impl_codec_for_tuple!(0, 1, 2, 3, 4, 5);
impl_codec_for_tuple!(0, 1, 2, 3, 4, 5, 6);
impl_codec_for_tuple!(0, 1, 2, 3, 4, 5, 6, 7);
impl_codec_for_tuple!(0, 1, 2, 3, 4, 5, 6, 7, 8);
impl_codec_for_tuple!(0, 1, 2, 3, 4, 5, 6, 7, 8, 9);
impl_codec_for_tuple!(0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10);
impl_codec_for_tuple!(0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11);

#[cfg(test)]
mod tests {
    use crate::{deserialize, serialize, Describe, Field, Schema};

    #[test]
    fn test_tuple() {
        let tuple_values = [(1u16, None), (1u16, Some(2u32))];
        for value in tuple_values {
            let encoded = serialize(&value);
            let decoded = deserialize::<(u16, Option<u32>)>(&encoded).unwrap();
            assert_eq!(value, decoded);
        }
    }

    #[test]
    fn test_tuple_schema() {
        const EXPECTED: Schema = Schema::Struct {
            fields: &[
                Field {
                    name: "0",
                    schema: &Schema::U8,
                },
                Field {
                    name: "1",
                    schema: &Schema::String,
                },
            ],
        };
        assert_eq!(<(u8, String)>::SCHEMA, &EXPECTED);
    }

    #[test]
    fn test_large_tuple() {
        let value = (1u8, 2u16, 3u32, 4u64, 5i8, 6i16, 7i32, 8i64, 'x', true, (), String::new());
        let encoded = serialize(&value);
        assert_eq!(deserialize(&encoded), Ok(value));
    }
}

use anyhow::Result;
use bytes::{Bytes, BytesMut};

use super::parsing_context::ParseContext;

const SIMPLE_STRING_PREFIX: char = '+';
const BULK_STRING_PREFIX: char = '$';
const ARRAY_PREFIX: char = '*';
const ERROR_PREFIX: char = '-';

#[macro_export]
macro_rules! write_array {
    ($($x:expr),*) => {
        $crate::domains::query_io::QueryIO::Array(vec![$($crate::domains::query_io::QueryIO::BulkString($x.into())),*])
    };
}

/// Not enough bytes buffered yet to finish the frame. The reader fetches
/// more data and retries the parse; every other parse failure is a protocol
/// error.
#[derive(Debug, thiserror::Error)]
#[error("incomplete frame")]
pub struct IncompleteFrame;

#[derive(Clone, Debug, PartialEq, Default)]
pub enum QueryIO {
    #[default]
    Null,
    SimpleString(Bytes),
    BulkString(Bytes),
    Array(Vec<QueryIO>),
    Err(Bytes),
}

impl QueryIO {
    pub fn serialize(self) -> Bytes {
        match self {
            QueryIO::Null => "$-1\r\n".into(),

            QueryIO::SimpleString(s) => Bytes::from(
                [Bytes::from(SIMPLE_STRING_PREFIX.to_string()), s, Bytes::from("\r\n")].concat(),
            ),

            QueryIO::BulkString(s) => Bytes::from(
                [
                    Bytes::from(BULK_STRING_PREFIX.to_string()),
                    Bytes::from(s.len().to_string()),
                    Bytes::from("\r\n"),
                    s,
                    Bytes::from("\r\n"),
                ]
                .concat(),
            ),

            QueryIO::Array(array) => {
                let mut buffer = BytesMut::with_capacity(array.len() * 32 + 16);
                buffer.extend_from_slice(format!("{}{}\r\n", ARRAY_PREFIX, array.len()).as_bytes());
                for item in array {
                    buffer.extend_from_slice(&item.serialize());
                }
                buffer.freeze()
            }

            QueryIO::Err(e) => Bytes::from(
                [Bytes::from(ERROR_PREFIX.to_string()), e, Bytes::from("\r\n")].concat(),
            ),
        }
    }

    pub fn unpack_single_entry<T>(self) -> Result<T>
    where
        T: std::str::FromStr<Err: std::error::Error + Sync + Send + 'static>,
    {
        match self {
            QueryIO::BulkString(s) => Ok(String::from_utf8(s.into())?.parse::<T>()?),
            _ => Err(anyhow::anyhow!("Expected value to be a bulk string")),
        }
    }
}

pub fn deserialize(buffer: BytesMut) -> Result<(QueryIO, usize)> {
    if buffer.is_empty() {
        return Err(IncompleteFrame.into());
    }
    match buffer[0] as char {
        SIMPLE_STRING_PREFIX => {
            let (bytes, len) = parse_simple_string(buffer)?;
            Ok((QueryIO::SimpleString(bytes), len))
        }
        ARRAY_PREFIX => parse_array(buffer),
        BULK_STRING_PREFIX => parse_bulk_string(buffer),
        ERROR_PREFIX => {
            let (bytes, len) = parse_simple_string(buffer)?;
            Ok((QueryIO::Err(bytes), len))
        }
        _ => Err(anyhow::anyhow!("Not a known value type {:?}", buffer)),
    }
}

// +OK\r\n
pub(crate) fn parse_simple_string(buffer: BytesMut) -> Result<(Bytes, usize)> {
    let (line, len) = read_until_crlf(&buffer[1..].into()).ok_or(IncompleteFrame)?;
    Ok((line, len + 1))
}

fn parse_array(buffer: BytesMut) -> Result<(QueryIO, usize)> {
    let mut ctx = ParseContext::new(buffer);

    // skip array prefix
    ctx.advance(1);

    let (count_bytes, count_len) =
        read_until_crlf(&BytesMut::from(&ctx.buffer[ctx.offset()..])).ok_or(IncompleteFrame)?;
    ctx.advance(count_len);

    let array_len = String::from_utf8(count_bytes.to_vec())?.parse::<usize>()?;

    let elements = (0..array_len).map(|_| ctx.parse_next()).collect::<Result<_>>()?;

    Ok((QueryIO::Array(elements), ctx.offset()))
}

fn parse_bulk_string(buffer: BytesMut) -> Result<(QueryIO, usize)> {
    let (line, mut len) = read_until_crlf(&buffer[1..].into()).ok_or(IncompleteFrame)?;

    // Adjust `len` to include the initial line
    len += 1;

    let content_len: i64 = String::from_utf8(line.to_vec())?.parse()?;

    // $-1\r\n is the null bulk string, the store's "no such key" reply
    if content_len < 0 {
        return Ok((QueryIO::Null, len));
    }

    let (line, total_len) = read_content_until_crlf(&buffer[len..].into(), content_len as usize)?;
    Ok((QueryIO::BulkString(line), len + total_len))
}

pub(super) fn read_content_until_crlf(
    buffer: &BytesMut,
    content_len: usize,
) -> Result<(Bytes, usize)> {
    if buffer.len() < content_len + 2 {
        return Err(IncompleteFrame.into());
    }
    if buffer[content_len] == b'\r' && buffer[content_len + 1] == b'\n' {
        return Ok((Bytes::copy_from_slice(&buffer[0..content_len]), content_len + 2));
    }
    Err(anyhow::anyhow!("Invalid BulkString format!"))
}

pub(super) fn read_until_crlf(buffer: &BytesMut) -> Option<(Bytes, usize)> {
    for i in 1..buffer.len() {
        if buffer[i - 1] == b'\r' && buffer[i] == b'\n' {
            return Some((Bytes::copy_from_slice(&buffer[0..(i - 1)]), i + 1));
        }
    }
    None
}

#[test]
fn test_parse_simple_string() {
    // GIVEN
    let buffer = BytesMut::from("+OK\r\n");

    // WHEN
    let (value, len) = parse_simple_string(buffer).unwrap();

    // THEN
    assert_eq!(len, 5);
    assert_eq!(value, b"OK".to_vec());
}

#[test]
fn test_parse_bulk_string() {
    // GIVEN
    let buffer = BytesMut::from("$5\r\nhello\r\n");

    // WHEN
    let (value, len) = deserialize(buffer).unwrap();

    // THEN
    assert_eq!(len, 11);
    assert_eq!(value, QueryIO::BulkString("hello".into()));
}

#[test]
fn test_parse_bulk_string_empty() {
    // GIVEN
    let buffer = BytesMut::from("$0\r\n\r\n");

    // WHEN
    let (value, len) = deserialize(buffer).unwrap();

    // THEN
    assert_eq!(len, 6);
    assert_eq!(value, QueryIO::BulkString("".into()));
}

#[test]
fn test_parse_null_bulk_string() {
    // GIVEN
    let buffer = BytesMut::from("$-1\r\n");

    // WHEN
    let (value, len) = deserialize(buffer).unwrap();

    // THEN
    assert_eq!(len, 5);
    assert_eq!(value, QueryIO::Null);
}

#[test]
fn test_truncated_array_is_incomplete_not_a_panic() {
    // GIVEN: an array header whose element never arrived
    let buffer = BytesMut::from("*1\r\n");

    // WHEN
    let result = deserialize(buffer);

    // THEN
    assert!(result.unwrap_err().downcast_ref::<IncompleteFrame>().is_some());
}

#[test]
fn test_empty_buffer_is_incomplete() {
    // GIVEN
    let buffer = BytesMut::new();

    // WHEN
    let result = deserialize(buffer);

    // THEN
    assert!(result.unwrap_err().downcast_ref::<IncompleteFrame>().is_some());
}

#[test]
fn test_truncated_bulk_string_is_incomplete() {
    // GIVEN
    let buffer = BytesMut::from("$5\r\nhel");

    // WHEN
    let result = deserialize(buffer);

    // THEN
    assert!(result.unwrap_err().downcast_ref::<IncompleteFrame>().is_some());
}

#[test]
fn test_bulk_string_without_trailing_crlf_is_a_protocol_error() {
    // GIVEN: the declared length is followed by junk instead of CRLF
    let buffer = BytesMut::from("$5\r\nhelloXX");

    // WHEN
    let result = deserialize(buffer);

    // THEN
    let err = result.unwrap_err();
    assert!(err.downcast_ref::<IncompleteFrame>().is_none());
}

#[test]
fn test_parse_error() {
    // GIVEN
    let buffer = BytesMut::from("-ERR invalid password\r\n");

    // WHEN
    let (value, len) = deserialize(buffer).unwrap();

    // THEN
    assert_eq!(len, 23);
    assert_eq!(value, QueryIO::Err("ERR invalid password".into()));
}

#[test]
fn test_parse_array() {
    // GIVEN
    let buffer = BytesMut::from("*2\r\n$5\r\nhello\r\n$5\r\nworld\r\n");

    // WHEN
    let (value, len) = deserialize(buffer).unwrap();

    // THEN
    assert_eq!(len, 26);
    assert_eq!(
        value,
        QueryIO::Array(vec![
            QueryIO::BulkString("hello".into()),
            QueryIO::BulkString("world".into()),
        ])
    );
}

#[test]
fn test_write_array_macro() {
    // GIVEN
    let command = write_array!("SET", "mykey", "myvalue");

    // WHEN
    let serialized = command.serialize();

    // THEN
    assert_eq!(serialized, Bytes::from("*3\r\n$3\r\nSET\r\n$5\r\nmykey\r\n$7\r\nmyvalue\r\n"));
}

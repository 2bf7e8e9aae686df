//! The converters for the well-known field types.

use crate::fields::converter::{DateTimeConverter, ListConverter, LongConverter, StringConverter, UriConverter};
use crate::fields::cookie::{CookieListConverter, SetCookieListConverter};
use crate::fields::language::LanguageRangeConverter;
use crate::fields::media::{MediaRangeConverter, MediaTypeConverter};
use crate::fields::product::ProductDescriptionsConverter;

pub const STRING: StringConverter = StringConverter;
pub const STRING_LIST: ListConverter<StringConverter> = ListConverter::new(StringConverter);
pub const LONG: LongConverter = LongConverter;
pub const DATE_TIME: DateTimeConverter = DateTimeConverter;
pub const URI: UriConverter = UriConverter;
pub const MEDIA_TYPE: MediaTypeConverter = MediaTypeConverter;
pub const MEDIA_RANGE_LIST: ListConverter<MediaRangeConverter> = ListConverter::new(MediaRangeConverter);
pub const LANGUAGE_LIST: ListConverter<LanguageRangeConverter> = ListConverter::new(LanguageRangeConverter);
pub const COOKIE_LIST: CookieListConverter = CookieListConverter;
pub const SET_COOKIE_LIST: SetCookieListConverter = SetCookieListConverter;
pub const PRODUCT_DESCRIPTIONS: ProductDescriptionsConverter = ProductDescriptionsConverter;

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    use super::*;
    use crate::fields::converter::Converter;

    /// Parses `lines`, writes the value back out and checks that parsing the
    /// output yields the same value.
    fn assert_round_trip<C>(converter: C, lines: &[&str])
    where
        C: Converter,
        C::Value: PartialEq,
    {
        let lines: Vec<String> = lines.iter().map(|line| (*line).to_owned()).collect();
        let value = converter.parse_lines(&lines).unwrap();
        let written = converter.field_lines(&value);
        assert_eq!(converter.parse_lines(&written).unwrap(), value, "{lines:?} written as {written:?}");
    }

    #[test]
    fn scalar_converters_round_trip() {
        assert_round_trip(STRING, &["some text"]);
        assert_round_trip(LONG, &["-42"]);
        assert_round_trip(URI, &["http://example.com/a?b=c"]);
        assert_round_trip(MEDIA_TYPE, &["text/html; charset=utf-8"]);
        assert_round_trip(DATE_TIME, &["Sunday, 06-Nov-94 08:49:37 GMT"]);
    }

    #[test]
    fn list_converters_round_trip() {
        assert_round_trip(STRING_LIST, &["keep-alive, Upgrade", "close"]);
        assert_round_trip(MEDIA_RANGE_LIST, &["text/plain; q=0.5, text/html, text/x-dvi; q=0.8, text/x-c"]);
        assert_round_trip(MEDIA_RANGE_LIST, &["text/*; level=\"1\"; q=0.3", "*/*; q=0.1"]);
        assert_round_trip(LANGUAGE_LIST, &["da, en-gb;q=0.8, en;q=0.7", "*;q=0.1"]);
        assert_round_trip(COOKIE_LIST, &["SID=31d4d96e407aad42; lang=en-US; empty="]);
        assert_round_trip(
            SET_COOKIE_LIST,
            &[
                "SRCHUID=V=2&GUID=2853211950; expires=Wed, 25-Jul-2018 12:42:14 GMT; path=/",
                "MUIDB=13BEF4C6DC68E5; path=/; httponly; expires=Wed, 25-Jul-2018 12:42:14 GMT",
            ],
        );
        assert_round_trip(SET_COOKIE_LIST, &["SID=31d4d96e407aad42; Path=/; Domain=example.com; Secure; HttpOnly"]);
        assert_round_trip(PRODUCT_DESCRIPTIONS, &["Mozilla/5.0 (X11; Linux x86_64) Gecko/20100101 Firefox/47.0"]);
        assert_round_trip(PRODUCT_DESCRIPTIONS, &["Apache/2.4.18 (Ubuntu)"]);
    }

    proptest! {
        #[test]
        fn dates_survive_serialization(secs in 0i64..4_102_444_800) {
            let date: DateTime<Utc> = Utc.timestamp_opt(secs, 0).unwrap();
            prop_assert_eq!(DATE_TIME.parse(&DATE_TIME.serialize(&date)).unwrap(), date);
        }

        #[test]
        fn token_lists_survive_serialization(tokens in proptest::collection::vec("[A-Za-z0-9!#$%&'*+.^_`|~-]{1,12}", 1..6)) {
            let lines = STRING_LIST.field_lines(&tokens);
            prop_assert_eq!(STRING_LIST.parse_lines(&lines).unwrap(), tokens);
        }
    }
}

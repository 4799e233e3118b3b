use std::io::Cursor;
use crate::config::{CacheSpec, LevelSpec};
use crate::error::{ConfigurationError, MissingField, SpecError, UnrecognizedDirectiveError};

const SPEC: &str = "\
# A two level hierarchy
blocksize 64
write_miss_policy allocate

replacement_policy LRU
level 512 4 write-back
# the last level cache
level 8192 16 write-through
";

#[test]
fn parses_all_directives() {
    let spec = CacheSpec::parse(SPEC).unwrap();
    assert_eq!(
        spec,
        CacheSpec {
            block_size: 64,
            write_miss_policy: "allocate".to_string(),
            replacement_policy: "LRU".to_string(),
            levels: vec![
                LevelSpec::new(512, 4, "write-back"),
                LevelSpec::new(8192, 16, "write-through"),
            ],
        }
    );
}

#[test]
fn reader_and_str_agree() {
    let from_reader = CacheSpec::from_reader(Cursor::new(SPEC)).unwrap();
    let from_str: CacheSpec = SPEC.parse().unwrap();
    assert_eq!(from_reader, from_str);
}

#[test]
fn comment_token_may_be_glued() {
    let spec = CacheSpec::parse("#blocksize 32\nblocksize 64\nwrite_miss_policy a\nreplacement_policy b\nlevel 1 1 c\n").unwrap();
    assert_eq!(spec.block_size, 64);
}

#[test]
fn missing_directives_are_reported_together() {
    match CacheSpec::parse("# nothing here\n") {
        Err(SpecError::Configuration(ConfigurationError::Underspecified(missing))) => assert_eq!(
            missing,
            vec![
                MissingField::Levels,
                MissingField::BlockSize,
                MissingField::WriteMissPolicy,
                MissingField::ReplacementPolicy,
            ]
        ),
        other => panic!("expected an underspecified configuration, got {other:?}"),
    }
}

#[test]
fn only_levels_missing() {
    let err = CacheSpec::parse("blocksize 64\nwrite_miss_policy a\nreplacement_policy b\n").unwrap_err();
    assert!(matches!(
        err,
        SpecError::Configuration(ConfigurationError::Underspecified(ref m)) if m == &vec![MissingField::Levels]
    ));
    assert_eq!(err.to_string(), "underspecified cache configuration: no cache levels specified");
}

#[test]
fn unknown_directive_is_fatal() {
    match CacheSpec::parse("blocksize 64\nlevels 1 1 wb\n") {
        Err(SpecError::UnrecognizedDirective(e)) => assert_eq!(
            e,
            UnrecognizedDirectiveError {
                line: 2,
                keyword: "levels".to_string()
            }
        ),
        other => panic!("expected an unrecognized directive, got {other:?}"),
    }
}

#[test]
fn wrong_token_count() {
    match CacheSpec::parse("blocksize 64 128\n") {
        Err(SpecError::Configuration(ConfigurationError::FieldCount { line, directive, expected, found })) => {
            assert_eq!((line, directive, expected, found), (1, "blocksize", 2, 3));
        }
        other => panic!("expected a field count error, got {other:?}"),
    }
    match CacheSpec::parse("blocksize 64\nlevel 512 4\n") {
        Err(SpecError::Configuration(ConfigurationError::FieldCount { line, directive, found, .. })) => {
            assert_eq!((line, directive, found), (2, "level", 3));
        }
        other => panic!("expected a field count error, got {other:?}"),
    }
}

#[test]
fn non_numeric_fields() {
    match CacheSpec::parse("blocksize sixty-four\n") {
        Err(SpecError::Configuration(ConfigurationError::NotANumber { field, value, .. })) => {
            assert_eq!(field, "blocksize");
            assert_eq!(value, "sixty-four");
        }
        other => panic!("expected a non-numeric error, got {other:?}"),
    }
    match CacheSpec::parse("level 512 four wb\n") {
        Err(SpecError::Configuration(ConfigurationError::NotANumber { field, .. })) => {
            assert_eq!(field, "level associativity");
        }
        other => panic!("expected a non-numeric error, got {other:?}"),
    }
}

#[test]
fn repeated_directive_is_rejected() {
    let err = CacheSpec::parse("replacement_policy LRU\nreplacement_policy FIFO\n").unwrap_err();
    assert!(matches!(
        err,
        SpecError::Configuration(ConfigurationError::Duplicate { line: 2, directive: "replacement_policy" })
    ));
}

#[test]
fn zero_block_size_parses_but_does_not_derive() {
    let spec = CacheSpec::parse("blocksize 0\nwrite_miss_policy a\nreplacement_policy b\nlevel 1 1 c\n").unwrap();
    assert!(crate::variant::derive(&spec).is_err());
}

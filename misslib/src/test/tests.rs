use std::error::Error;
use std::fs::{self, File};
use std::io::{BufReader, Write};
use std::num::NonZeroU64;
use crate::classifier::{classify_stream, LabelLine, MissClass, Reference};
use crate::config::CacheSpec;
use crate::document::Format;
use crate::io::{get_reader, write_variants, VariantFiles};
use crate::variant::{derive, Variant};

const SPEC: &str = "\
blocksize 64
write_miss_policy allocate
replacement_policy LRU
level 100 4 write-back
";

#[test]
fn derive_writes_named_files() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let variants = derive(&CacheSpec::parse(SPEC)?)?;
    let files = write_variants(&variants, Some(dir.path()), Format::Xml)?;
    assert_eq!(files.capacity, dir.path().join("capacity.xml"));
    assert_eq!(files.associative, dir.path().join("associative.xml"));
    assert_eq!(files.real, dir.path().join("real.xml"));
    assert!(fs::read_to_string(&files.capacity)?.contains(r#"associativity="1""#));
    assert!(fs::read_to_string(&files.associative)?.contains(r#"replacement_policy="OPT""#));
    assert!(fs::read_to_string(&files.real)?.contains(r#"replacement_policy="LRU""#));
    // Nothing but the three documents is left behind
    assert_eq!(fs::read_dir(dir.path())?.count(), 3);
    Ok(())
}

#[test]
fn derive_writes_kept_temporary_files() -> Result<(), Box<dyn Error>> {
    let variants = derive(&CacheSpec::parse(SPEC)?)?;
    let files = write_variants(&variants, None, Format::Json)?;
    for (path, expected) in files.paths().into_iter().zip(variants.iter()) {
        let written: Variant = serde_json::from_reader(BufReader::new(File::open(path)?))?;
        assert_eq!(&written, expected);
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("json"));
        fs::remove_file(path)?;
    }
    Ok(())
}

#[test]
fn failed_write_leaves_no_files() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    // A directory where the real document should go makes the last file impossible to put in place
    fs::create_dir(dir.path().join("real.xml"))?;
    let variants = derive(&CacheSpec::parse(SPEC)?)?;
    assert!(write_variants(&variants, Some(dir.path()), Format::Xml).is_err());
    assert!(!dir.path().join("capacity.xml").exists());
    assert!(!dir.path().join("associative.xml").exists());
    let left: Vec<_> = fs::read_dir(dir.path())?.collect::<Result<_, _>>()?;
    assert_eq!(left.len(), 1);
    assert!(left[0].path().is_dir());
    Ok(())
}

#[test]
fn derive_report_line() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let mut spec = CacheSpec::parse(SPEC)?;
    spec.levels.push(spec.levels[0].clone());
    let files = write_variants(&derive(&spec)?, Some(dir.path()), Format::Xml)?;
    assert_eq!((files.block_size, files.num_levels), (64, 2));
    assert_eq!(
        files.to_string(),
        format!(
            "{} {} {} 64 2",
            dir.path().join("capacity.xml").display(),
            dir.path().join("associative.xml").display(),
            dir.path().join("real.xml").display()
        )
    );
    let fixed = VariantFiles {
        capacity: "o/capacity.xml".into(),
        associative: "o/associative.xml".into(),
        real: "o/real.xml".into(),
        block_size: 64,
        num_levels: 1,
    };
    assert_eq!(fixed.to_string(), "o/capacity.xml o/associative.xml o/real.xml 64 1");
    Ok(())
}

#[test]
fn classify_output_lines() -> Result<(), Box<dyn Error>> {
    let input = "0 9 9 9\n0 9 9 9\n128 9 9 9\n128 1 9 9\n130 9 1 9\n191 9 9 1\n";
    let lines: Vec<String> = classify_stream(input.as_bytes(), NonZeroU64::new(64).ok_or("zero")?, 1)
        .map(|r| r.map(|(reference, class)| LabelLine::new(&reference, class).to_string()))
        .collect::<Result<_, _>>()?;
    assert_eq!(
        lines,
        vec!["0 compulsory", "0 hit", "128 compulsory", "128 capacity", "130 mapping", "191 replacement"]
    );
    assert_eq!(LabelLine::new(&Reference::new(4096, 9, 9, 9), MissClass::Hit).to_string(), "4096 hit");
    Ok(())
}

#[test]
fn classify_from_file() -> Result<(), Box<dyn Error>> {
    let mut file = tempfile::NamedTempFile::new()?;
    file.write_all(b"0 9 9 9\n0 9 9 9\n128 9 9 9\n128 1 9 9\n")?;
    file.flush()?;
    let reader = get_reader(File::open(file.path())?)?;
    let labels: Vec<MissClass> = classify_stream(reader, NonZeroU64::new(64).ok_or("zero")?, 1)
        .map(|r| r.map(|(_, class)| class))
        .collect::<Result<_, _>>()?;
    assert_eq!(labels, vec![MissClass::Compulsory, MissClass::Hit, MissClass::Compulsory, MissClass::Capacity]);
    Ok(())
}

#[test]
fn empty_file_classifies_nothing() -> Result<(), Box<dyn Error>> {
    let file = tempfile::NamedTempFile::new()?;
    let reader = get_reader(File::open(file.path())?)?;
    assert_eq!(classify_stream(reader, NonZeroU64::new(64).ok_or("zero")?, 1).count(), 0);
    Ok(())
}

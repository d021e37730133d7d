use super::read::SiteRead;
use rust_htslib::bam::record::CigarString;

pub fn make_read(start: i64, encoding: &str, bases: &str) -> SiteRead {
    SiteRead {
        id: "test_read".to_string(),
        start,
        ops: CigarString::try_from(encoding).unwrap().to_vec(),
        bases: bases.as_bytes().to_vec(),
    }
}

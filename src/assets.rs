use crate::error::Result;
use include_dir::{include_dir, Dir};

static DATA_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/data");

/// Contents of a data file compiled into the binary.
pub(crate) fn embedded_file(name: &str) -> Result<&'static [u8]> {
    DATA_DIR
        .get_file(name)
        .map(|f| f.contents())
        .ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("embedded data file {name} missing"),
            )
            .into()
        })
}

// Copyright 2021 Locha Mesh Developers <contact@locha.io>
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::{fs, path::Path};

use stc_isp::{util, Programmer, Transport};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};

/// Read a raw binary firmware image.
pub fn load_image(path: &Path) -> Result<Vec<u8>> {
    let binary = fs::read(path).with_context(|| {
        format!("Couldn't open firmware file: `{}`", path.display())
    })?;

    if binary.is_empty() {
        log::warn!("Firmware file `{}` is empty", path.display());
    }

    log::info!("Binary file size: {} bytes", binary.len());

    Ok(binary)
}

/// Write `binary` at the start of the flash.
pub fn flash<P>(
    binary: &[u8],
    chunk_size: usize,
    isp: &mut Programmer<P>,
) -> Result<()>
where
    P: Transport,
{
    let pb = ProgressBar::new(binary.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {bytes}/{total_bytes}")
            .progress_chars("##-"),
    );

    let result = util::write_flash_range(isp, 0, binary, chunk_size, |written| {
        pb.set_position(written as u64)
    });
    pb.finish_and_clear();

    result.context("Failed to write to flash")
}

#[cfg(test)]
mod test {
    use std::{env, process};

    use super::*;

    fn temp_image(name: &str, data: &[u8]) -> std::path::PathBuf {
        let path = env::temp_dir()
            .join(format!("stc-isp-prog-{}-{}.bin", process::id(), name));
        fs::write(&path, data).unwrap();
        path
    }

    #[test]
    fn test_load_image() {
        let path = temp_image("image", &[0x02, 0x00, 0x03]);
        assert_eq!(load_image(&path).unwrap(), [0x02, 0x00, 0x03]);
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_load_empty_image() {
        let path = temp_image("empty", &[]);
        assert!(load_image(&path).unwrap().is_empty());
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_load_missing_image() {
        let path = env::temp_dir().join("stc-isp-prog-missing.bin");
        let err = load_image(&path).unwrap_err();
        assert!(err.to_string().starts_with("Couldn't open firmware file"));
    }
}

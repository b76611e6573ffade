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

use stc_isp::ports::PortInfo;

use anyhow::Result;

/// List subcommand entry point.
pub fn list() -> Result<()> {
    let ports = PortInfo::list_all();
    if ports.is_empty() {
        println!("No serial ports found");
        return Ok(());
    }

    for port in ports {
        let mut line = format!("- `{}`", port.port.to_string_lossy());

        if let Some(usb_info) = port.usb_info {
            line.push_str(&format!(" {:04X}:{:04X}", usb_info.vid, usb_info.pid));
            for text in [usb_info.manufacturer, usb_info.product].iter().flatten() {
                line.push(' ');
                line.push_str(text);
            }
        }

        println!("{}", line);
    }

    Ok(())
}

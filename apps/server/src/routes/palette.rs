// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::types::ColourInfo;
use axum::Json;
use ifc_marker::PALETTE;

/// GET /api/v1/palette - Marking colours in display order.
pub async fn list() -> Json<Vec<ColourInfo>> {
    Json(
        PALETTE
            .iter()
            .map(|c| ColourInfo {
                name: c.name,
                rgb: c.rgb,
                hex: c.hex(),
            })
            .collect(),
    )
}

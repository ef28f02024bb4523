// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};

/// 用户兴趣画像
///
/// 一段自由文本，整个运行期间只读
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub free_text: String,
}

impl Profile {
    pub fn new(free_text: impl Into<String>) -> Self {
        Self {
            free_text: free_text.into(),
        }
    }
}

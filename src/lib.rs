//
//  Copyright (C) 2022-2024  Chase Ruskin
//
//  This program is free software: you can redistribute it and/or modify
//  it under the terms of the GNU General Public License as published by
//  the Free Software Foundation, either version 3 of the License, or
//  (at your option) any later version.
//
//  This program is distributed in the hope that it will be useful,
//  but WITHOUT ANY WARRANTY; without even the implied warranty of
//  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
//  GNU General Public License for more details.
//
//  You should have received a copy of the GNU General Public License
//  along with this program.  If not, see <http://www.gnu.org/licenses/>.
//

pub mod core;
pub mod error;
pub mod util;

pub use crate::core::database::Database;
pub use crate::core::design::Design;
pub use crate::core::display::DisplayToken;
pub use crate::core::display::TokenKind;
pub use crate::core::format::FormatRadix;
pub use crate::error::Error;
pub use crate::util::filesystem::FileResolver;
pub use crate::util::filesystem::NullResolver;
pub use crate::util::filesystem::SourceResolver;

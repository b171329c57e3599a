// Owner classification and the deterministic colour assignment used for rendering.

use image::Rgba;

/// Owner ids at or below this value belong to individual players, not tribes.
pub const PLAYER_ID_THRESHOLD: u64 = 1_000_050_000;

const UNCLAIMED_COLOR: Rgba<u8> = Rgba([0x00, 0x00, 0x00, 0xff]);
const PLAYER_COLOR: Rgba<u8> = Rgba([0xa9, 0xa9, 0xa9, 0xff]);

// yellow, blue, purple, coral
const TRIBE_PALETTE: [Rgba<u8>; 4] = [
    Rgba([0xff, 0xff, 0x00, 0xff]),
    Rgba([0x00, 0x00, 0xff, 0xff]),
    Rgba([0x80, 0x00, 0x80, 0xff]),
    Rgba([0xff, 0x7f, 0x50, 0xff]),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnerClass {
    Unclaimed,
    Player,
    Tribe,
}

impl OwnerClass {
    pub fn of(owner_id: u64) -> Self {
        if owner_id == 0 {
            OwnerClass::Unclaimed
        } else if owner_id > PLAYER_ID_THRESHOLD {
            OwnerClass::Tribe
        } else {
            OwnerClass::Player
        }
    }
}

/// Colour for an owner; tribes pick from the palette by id so every tile and run agrees.
pub fn owner_color(owner_id: u64) -> Rgba<u8> {
    match OwnerClass::of(owner_id) {
        OwnerClass::Unclaimed => UNCLAIMED_COLOR,
        OwnerClass::Player => PLAYER_COLOR,
        OwnerClass::Tribe => TRIBE_PALETTE[(owner_id % TRIBE_PALETTE.len() as u64) as usize],
    }
}

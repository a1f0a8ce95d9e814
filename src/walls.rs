use crate::geometry::Rect;

/// Closed border frame around the dot field.
static LAYOUT_FRAME: [Rect; 4] = [
    Rect::new(50, 50, 10, 300),
    Rect::new(50, 50, 300, 10),
    Rect::new(340, 50, 10, 300),
    Rect::new(50, 340, 300, 10),
];

/// Sparse interior obstacles.
static LAYOUT_SPARSE: [Rect; 3] = [
    Rect::new(50, 100, 10, 200),
    Rect::new(150, 50, 200, 10),
    Rect::new(50, 50, 10, 10),
];

static LAYOUTS: [&[Rect]; 2] = [&LAYOUT_FRAME, &LAYOUT_SPARSE];

/// Wall layout for a level. Levels beyond the registry wrap around.
pub fn walls_for(level: i32) -> &'static [Rect] {
    LAYOUTS[level.rem_euclid(LAYOUTS.len() as i32) as usize]
}

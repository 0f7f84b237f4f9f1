//! Seal wiggle artwork, eight box-drawn frames swaying left and right.

/// The default `seal` animation
pub const SEAL_FRAMES: &[&str] = &[
    r#"      _______________
    /                 \
   /                   \
  /                     \
 /   ●             ●     \
|                         |
|           ▲             |
|          / \            |
|         /___\           |
 \                       /
  \                     /
   \___________________/
────\                 /────
─────\               /─────
──────\             /──────
───────\___________/───────"#,
    r#"       _______________
     /                 \
    /                   \
   /                     \
  /   ●             ●     \
 |                         |
 |           ▲             |
 |          / \            |
 |         /___\           |
  \                       /
   \                     /
    \___________________/
─────\                 /────
──────\               /─────
───────\             /──────
────────\___________/───────"#,
    r#"        _______________
      /                 \
     /                   \
    /                     \
   /   ●             ●     \
  |                         |
  |           ▲             |
  |          / \            |
  |         /___\           |
   \                       /
    \                     /
     \___________________/
──────\                 /────
───────\               /─────
────────\             /──────
─────────\___________/───────"#,
    r#"       _______________
     /                 \
    /                   \
   /                     \
  /   ●             ●     \
 |                         |
 |           ▲             |
 |          / \            |
 |         /___\           |
  \                       /
   \                     /
    \___________________/
─────\                 /────
──────\               /─────
───────\             /──────
────────\___________/───────"#,
    r#"      _______________
    /                 \
   /                   \
  /                     \
 /   ●             ●     \
|                         |
|           ▲             |
|          / \            |
|         /___\           |
 \                       /
  \                     /
   \___________________/
────\                 /────
─────\               /─────
──────\             /──────
───────\___________/───────"#,
    r#"     _______________
   /                 \
  /                   \
 /                     \
/   ●             ●     \
|                         |
|           ▲             |
|          / \            |
|         /___\           |
 \                       /
  \                     /
   \___________________/
───\                 /────
────\               /─────
─────\             /──────
──────\___________/───────"#,
    r#"    _______________
  /                 \
 /                   \
/                     \
/   ●             ●     \
|                         |
|           ▲             |
|          / \            |
|         /___\           |
\                       /
 \                     /
  \___________________/
──\                 /────
───\               /─────
────\             /──────
─────\___________/───────"#,
    r#"     _______________
   /                 \
  /                   \
 /                     \
/   ●             ●     \
|                         |
|           ▲             |
|          / \            |
|         /___\           |
 \                       /
  \                     /
   \___________________/
───\                 /────
────\               /─────
─────\             /──────
──────\___________/───────"#,
];

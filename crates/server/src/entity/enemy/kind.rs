//! Enemy type tags and their display table.

use protocol::Color;

/// Enemy type tag, as sent to clients.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnemyKind {
    Basic = 0,
    Sniper = 1,
    Dasher = 2,
    Homing = 3,
    VoidCrawler = 4,
    Wall = 5,
    RecursiveBulletBoss = 6,
}

/// Static per-kind data.
#[derive(Debug)]
pub struct KindInfo {
    pub name: &'static str,
    pub color: Color,
}

/// Indexed by `EnemyKind as usize`.
static KIND_TABLE: [KindInfo; 7] = [
    KindInfo { name: "basic", color: Color::new(128, 128, 128) },
    KindInfo { name: "sniper", color: Color::new(160, 82, 45) },
    KindInfo { name: "dasher", color: Color::new(0, 0, 139) },
    KindInfo { name: "homing", color: Color::new(210, 105, 30) },
    KindInfo { name: "void_crawler", color: Color::new(45, 0, 75) },
    KindInfo { name: "wall", color: Color::new(70, 70, 70) },
    KindInfo { name: "recursive_bullet_boss", color: Color::new(178, 34, 34) },
];

impl EnemyKind {
    pub const ALL: [EnemyKind; 7] = [
        EnemyKind::Basic,
        EnemyKind::Sniper,
        EnemyKind::Dasher,
        EnemyKind::Homing,
        EnemyKind::VoidCrawler,
        EnemyKind::Wall,
        EnemyKind::RecursiveBulletBoss,
    ];

    #[inline]
    pub fn info(self) -> &'static KindInfo {
        &KIND_TABLE[self as usize]
    }

    #[inline]
    pub fn name(self) -> &'static str {
        self.info().name
    }

    #[inline]
    pub fn color(self) -> Color {
        self.info().color
    }

    #[inline]
    pub fn tag(self) -> u8 {
        self as u8
    }
}

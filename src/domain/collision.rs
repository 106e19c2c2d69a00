/// Collision classification and contact routing, table driven.
///
/// Every physical actor carries one `CollisionCategory` and a profile of
/// two category sets:
///   - `blocked_by`           : categories that physically stop it
///   - `reports_contact_with` : categories that produce a semantic event
///
/// Blocking is the broad-phase's business (it reads `blocked_by`).
/// This module only answers "which semantic event does this contact mean".
///
/// ## Routing Table
///
/// Pairs are ordered by category precedence (declaration order below)
/// before lookup, so (Item, Player) and (Player, Item) route the same.
/// ┌───────────────────────────────┬──────────────────────────────┐
/// │ Ordered pair                   │ Event                        │
/// ├───────────────────────────────┼──────────────────────────────┤
/// │ Player, Item                   │ PickUp                       │
/// │ Player, Npc "Exit"             │ LevelExitReached             │
/// │ Player, Npc                    │ NpcTalk                      │
/// │ Player, Enemy                  │ PlayerDamaged                │
/// │ Player, EnemyProjectile        │ PlayerDamaged                │
/// │ PlayerProjectile, Structure    │ ProjectileStop               │
/// │ PlayerProjectile, Object       │ Damage if destructible, else Stop │
/// │ PlayerProjectile, Enemy        │ Damage if destructible, else Stop │
/// │ EnemyProjectile, Structure     │ ProjectileStop               │
/// │ EnemyProjectile, Object        │ Damage if destructible, else Stop │
/// │ anything else                  │ no event                     │
/// └───────────────────────────────┴──────────────────────────────┘
///
/// A pair only routes if at least one side reports contact with the other.

use super::actor::ActorId;

/// Name that turns an NPC into the level exit.
pub const EXIT_NAME: &str = "Exit";

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub enum CollisionCategory {
    Player,
    PlayerProjectile,
    EnemyProjectile,
    Structure,
    Object,
    Item,
    Npc,
    Enemy,
}

impl CollisionCategory {
    pub const COUNT: usize = 8;

    pub const ALL: [CollisionCategory; Self::COUNT] = [
        CollisionCategory::Player,
        CollisionCategory::PlayerProjectile,
        CollisionCategory::EnemyProjectile,
        CollisionCategory::Structure,
        CollisionCategory::Object,
        CollisionCategory::Item,
        CollisionCategory::Npc,
        CollisionCategory::Enemy,
    ];

    fn index(self) -> usize {
        self as usize
    }

    /// Lower value routes first.
    pub fn precedence(self) -> usize {
        self.index()
    }

    pub fn is_affected_by_gravity(self) -> bool {
        matches!(
            self,
            CollisionCategory::Player
                | CollisionCategory::Object
                | CollisionCategory::Npc
                | CollisionCategory::Enemy
        )
    }
}

/// Explicit membership table, one slot per category.
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
pub struct CategorySet {
    members: [bool; CollisionCategory::COUNT],
}

impl CategorySet {
    pub const EMPTY: CategorySet = CategorySet { members: [false; CollisionCategory::COUNT] };

    pub fn of(categories: &[CollisionCategory]) -> Self {
        let mut set = CategorySet::EMPTY;
        for &c in categories {
            set.insert(c);
        }
        set
    }

    pub fn insert(&mut self, category: CollisionCategory) {
        self.members[category.index()] = true;
    }

    pub fn remove(&mut self, category: CollisionCategory) {
        self.members[category.index()] = false;
    }

    pub fn contains(&self, category: CollisionCategory) -> bool {
        self.members[category.index()]
    }

    pub fn is_empty(&self) -> bool {
        !self.members.iter().any(|&m| m)
    }

    pub fn iter(&self) -> impl Iterator<Item = CollisionCategory> + '_ {
        CollisionCategory::ALL.into_iter().filter(|c| self.contains(*c))
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct CollisionProfile {
    pub category: CollisionCategory,
    pub blocked_by: CategorySet,
    pub reports_contact_with: CategorySet,
}

impl CollisionProfile {
    /// Default profile per category.
    pub fn for_category(category: CollisionCategory) -> Self {
        use CollisionCategory::*;
        let (blocked_by, reports): (&[CollisionCategory], &[CollisionCategory]) = match category {
            Player           => (&[Structure, Object, Npc, Enemy], &[Item, Npc, Enemy, EnemyProjectile]),
            PlayerProjectile => (&[Structure, Object, Enemy],      &[Structure, Object, Enemy]),
            EnemyProjectile  => (&[Structure, Object, Player],     &[Structure, Object, Player]),
            Structure        => (&[],                              &[]),
            Object           => (&[Structure, Object],             &[PlayerProjectile, EnemyProjectile]),
            Item             => (&[Structure],                     &[Player]),
            Npc              => (&[Structure, Object],             &[Player]),
            Enemy            => (&[Structure, Object, Player],     &[Player, PlayerProjectile]),
        };
        CollisionProfile {
            category,
            blocked_by: CategorySet::of(blocked_by),
            reports_contact_with: CategorySet::of(reports),
        }
    }

    pub fn is_blocked_by(&self, other: CollisionCategory) -> bool {
        self.blocked_by.contains(other)
    }

    pub fn reports(&self, other: CollisionCategory) -> bool {
        self.reports_contact_with.contains(other)
    }
}

/// One side of a contact, as seen by the router.
#[derive(Clone, Copy, Debug)]
pub struct ContactParty<'a> {
    pub id: ActorId,
    pub profile: &'a CollisionProfile,
    pub name: &'a str,
    pub destructible: bool,
}

impl ContactParty<'_> {
    fn category(&self) -> CollisionCategory {
        self.profile.category
    }
}

/// Semantic meaning of an informational contact.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ContactEvent {
    PickUp { player: ActorId, item: ActorId },
    ProjectileStop { projectile: ActorId },
    Damage { projectile: ActorId, target: ActorId },
    PlayerDamaged { player: ActorId, source: ActorId },
    LevelExitReached { player: ActorId },
    NpcTalk { player: ActorId, npc: ActorId },
}

/// Route a raw contact to its semantic event. Unknown pairs yield `None`.
pub fn route(a: &ContactParty, b: &ContactParty) -> Option<ContactEvent> {
    if !a.profile.reports(b.category()) && !b.profile.reports(a.category()) {
        return None;
    }

    let (first, second) = if a.category().precedence() <= b.category().precedence() {
        (a, b)
    } else {
        (b, a)
    };

    use CollisionCategory::*;
    match (first.category(), second.category()) {
        (Player, Item) => Some(ContactEvent::PickUp { player: first.id, item: second.id }),
        (Player, Npc) if second.name == EXIT_NAME => {
            Some(ContactEvent::LevelExitReached { player: first.id })
        }
        (Player, Npc) => Some(ContactEvent::NpcTalk { player: first.id, npc: second.id }),
        (Player, Enemy) | (Player, EnemyProjectile) => {
            Some(ContactEvent::PlayerDamaged { player: first.id, source: second.id })
        }
        (PlayerProjectile, Structure) | (EnemyProjectile, Structure) => {
            Some(ContactEvent::ProjectileStop { projectile: first.id })
        }
        (PlayerProjectile, Object) | (PlayerProjectile, Enemy) | (EnemyProjectile, Object) => {
            if second.destructible {
                Some(ContactEvent::Damage { projectile: first.id, target: second.id })
            } else {
                Some(ContactEvent::ProjectileStop { projectile: first.id })
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn party<'a>(id: u32, profile: &'a CollisionProfile, name: &'a str, destructible: bool) -> ContactParty<'a> {
        ContactParty { id: ActorId(id), profile, name, destructible }
    }

    #[test]
    fn category_set_membership() {
        let mut s = CategorySet::of(&[CollisionCategory::Item, CollisionCategory::Enemy]);
        assert!(s.contains(CollisionCategory::Item));
        assert!(!s.contains(CollisionCategory::Npc));
        s.remove(CollisionCategory::Item);
        assert_eq!(s.iter().collect::<Vec<_>>(), vec![CollisionCategory::Enemy]);
        assert!(CategorySet::EMPTY.is_empty());
    }

    #[test]
    fn masks_may_overlap() {
        let p = CollisionProfile::for_category(CollisionCategory::Player);
        assert!(p.is_blocked_by(CollisionCategory::Enemy));
        assert!(p.reports(CollisionCategory::Enemy));
        assert!(!p.is_blocked_by(CollisionCategory::Item));
    }

    #[test]
    fn projectile_stops_on_structure() {
        let shot = CollisionProfile::for_category(CollisionCategory::PlayerProjectile);
        let wall = CollisionProfile::for_category(CollisionCategory::Structure);
        let ev = route(&party(1, &shot, "shot", false), &party(2, &wall, "wall", false));
        assert_eq!(ev, Some(ContactEvent::ProjectileStop { projectile: ActorId(1) }));
    }

    #[test]
    fn projectile_damages_destructible_object() {
        let shot = CollisionProfile::for_category(CollisionCategory::PlayerProjectile);
        let crate_ = CollisionProfile::for_category(CollisionCategory::Object);
        let ev = route(&party(2, &crate_, "crate", true), &party(1, &shot, "shot", false));
        assert_eq!(ev, Some(ContactEvent::Damage { projectile: ActorId(1), target: ActorId(2) }));

        let ev = route(&party(1, &shot, "shot", false), &party(2, &crate_, "crate", false));
        assert_eq!(ev, Some(ContactEvent::ProjectileStop { projectile: ActorId(1) }));
    }

    #[test]
    fn pair_order_does_not_matter() {
        let player = CollisionProfile::for_category(CollisionCategory::Player);
        let coin = CollisionProfile::for_category(CollisionCategory::Item);
        let a = route(&party(1, &player, "player", false), &party(9, &coin, "coin", false));
        let b = route(&party(9, &coin, "coin", false), &party(1, &player, "player", false));
        assert_eq!(a, b);
        assert_eq!(a, Some(ContactEvent::PickUp { player: ActorId(1), item: ActorId(9) }));
    }

    #[test]
    fn exit_npc_by_name() {
        let player = CollisionProfile::for_category(CollisionCategory::Player);
        let npc = CollisionProfile::for_category(CollisionCategory::Npc);
        assert_eq!(
            route(&party(1, &player, "player", false), &party(4, &npc, EXIT_NAME, false)),
            Some(ContactEvent::LevelExitReached { player: ActorId(1) })
        );
        assert_eq!(
            route(&party(1, &player, "player", false), &party(5, &npc, "Sage", false)),
            Some(ContactEvent::NpcTalk { player: ActorId(1), npc: ActorId(5) })
        );
    }

    #[test]
    fn player_hurt_by_enemy_and_enemy_shot() {
        let player = CollisionProfile::for_category(CollisionCategory::Player);
        let enemy = CollisionProfile::for_category(CollisionCategory::Enemy);
        let shot = CollisionProfile::for_category(CollisionCategory::EnemyProjectile);
        assert_eq!(
            route(&party(1, &player, "player", false), &party(3, &enemy, "bat", true)),
            Some(ContactEvent::PlayerDamaged { player: ActorId(1), source: ActorId(3) })
        );
        assert_eq!(
            route(&party(7, &shot, "spit", false), &party(1, &player, "player", false)),
            Some(ContactEvent::PlayerDamaged { player: ActorId(1), source: ActorId(7) })
        );
    }

    #[test]
    fn unknown_pairs_are_silent() {
        let player = CollisionProfile::for_category(CollisionCategory::Player);
        let wall = CollisionProfile::for_category(CollisionCategory::Structure);
        let crate_ = CollisionProfile::for_category(CollisionCategory::Object);
        assert_eq!(route(&party(1, &player, "p", false), &party(2, &wall, "w", false)), None);
        assert_eq!(route(&party(2, &wall, "w", false), &party(3, &crate_, "c", true)), None);
    }

    #[test]
    fn unreported_pair_is_silent_even_if_table_has_it() {
        let player = CollisionProfile::for_category(CollisionCategory::Player);
        let mut deaf_coin = CollisionProfile::for_category(CollisionCategory::Item);
        deaf_coin.reports_contact_with = CategorySet::EMPTY;
        let mut deaf_player = player;
        deaf_player.reports_contact_with.remove(CollisionCategory::Item);
        assert_eq!(route(&party(1, &deaf_player, "p", false), &party(2, &deaf_coin, "c", false)), None);
    }
}

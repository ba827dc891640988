//! Сопоставление основного ассета с иконкой по соглашению об именах.
//!
//! Иконка `<base>_icon` относится к ассету `<base>`; сравнение без учёта регистра.
//! Если у иконки нет суффикса, её базовое имя совпадает с именем.
//! При нескольких иконках на одно базовое имя побеждает первая встреченная.

use std::collections::HashMap;

use crate::ICON_SUFFIX;

/// Объект, имеющий имя (без расширения)
pub trait Named {
    fn name(&self) -> &str;
}

impl Named for str {
    fn name(&self) -> &str {
        self
    }
}

impl Named for String {
    fn name(&self) -> &str {
        self
    }
}

impl<T: Named + ?Sized> Named for &T {
    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Есть ли у имени суффикс `_icon` (без учёта регистра)
pub fn has_icon_suffix(name: &str) -> bool {
    split_icon_suffix(name).is_some()
}

fn split_icon_suffix(name: &str) -> Option<&str> {
    let cut = name.len().checked_sub(ICON_SUFFIX.len())?;
    if !name.is_char_boundary(cut) {
        return None;
    }
    let (base, suffix) = name.split_at(cut);
    suffix.eq_ignore_ascii_case(ICON_SUFFIX).then_some(base)
}

/// Базовое имя: `Cap_icon` -> `Cap`, `Cap` -> `Cap`
pub fn name_base(name: &str) -> &str {
    split_icon_suffix(name).unwrap_or(name)
}

fn key(name: &str) -> String {
    name_base(name).to_lowercase()
}

/// Индекс иконок по базовому имени. Первая иконка побеждает, поздние дубликаты отбрасываются.
#[derive(Debug, Clone)]
pub struct IconIndex<T> {
    by_base: HashMap<String, T>,
}

impl<T> Default for IconIndex<T> {
    fn default() -> Self {
        Self {
            by_base: HashMap::new(),
        }
    }
}

impl<T: Named> IconIndex<T> {
    pub fn build(icons: impl IntoIterator<Item = T>) -> Self {
        let mut index = Self::default();
        for icon in icons {
            index.insert(icon);
        }
        index
    }

    /// Добавить иконку. Возвращает `false`, если базовое имя уже занято.
    pub fn insert(&mut self, icon: T) -> bool {
        let key = key(icon.name());
        if self.by_base.contains_key(&key) {
            return false;
        }
        self.by_base.insert(key, icon);
        true
    }

    /// Найти иконку для основного ассета
    pub fn lookup(&self, primary_name: &str) -> Option<&T> {
        self.by_base.get(&key(primary_name))
    }

    pub fn len(&self) -> usize {
        self.by_base.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_base.is_empty()
    }
}

/// Основной ассет и найденная для него иконка (если есть)
#[derive(Debug, Clone, PartialEq)]
pub struct MatchedPair<P, I> {
    pub primary: P,
    pub icon: Option<I>,
}

/// Сопоставить каждому основному ассету иконку. Порядок основных ассетов сохраняется.
pub fn match_icons<P, I>(
    primaries: impl IntoIterator<Item = P>,
    icons: impl IntoIterator<Item = I>,
) -> Vec<MatchedPair<P, I>>
where
    P: Named,
    I: Named + Clone,
{
    let index = IconIndex::build(icons);
    primaries
        .into_iter()
        .map(|primary| {
            let icon = index.lookup(primary.name()).cloned();
            MatchedPair { primary, icon }
        })
        .collect()
}

/// Найти иконку для одного имени среди кандидатов
pub fn find_icon<'a>(primary_name: &str, icons: &[&'a str]) -> Option<&'a str> {
    IconIndex::build(icons.iter().copied())
        .lookup(primary_name)
        .copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_base() {
        assert_eq!(name_base("Cap_icon"), "Cap");
        assert_eq!(name_base("Cap_ICON"), "Cap");
        assert_eq!(name_base("Cap"), "Cap");
        assert_eq!(name_base("_icon"), "");
        assert_eq!(name_base("icon"), "icon");
    }

    #[test]
    fn test_find_icon_matches_suffix() {
        assert_eq!(find_icon("Cap", &["Cap_icon", "Hat_icon"]), Some("Cap_icon"));
        assert_eq!(find_icon("Hat", &["Cap_icon", "Hat_icon"]), Some("Hat_icon"));
    }

    #[test]
    fn test_find_icon_none() {
        assert_eq!(find_icon("Cap", &[]), None);
        assert_eq!(find_icon("Cap", &["Hat_icon"]), None);
    }

    #[test]
    fn test_find_icon_case_insensitive() {
        assert_eq!(find_icon("CAP", &["cap_icon"]), Some("cap_icon"));
        assert_eq!(find_icon("cap", &["CAP_Icon"]), Some("CAP_Icon"));
    }

    #[test]
    fn test_icon_without_suffix_matches_same_name() {
        assert_eq!(find_icon("Cap", &["Cap"]), Some("Cap"));
        assert_eq!(find_icon("Cap", &["cap"]), Some("cap"));
    }

    #[test]
    fn test_first_icon_wins() {
        assert_eq!(find_icon("Cap", &["Cap_icon", "CAP_ICON"]), Some("Cap_icon"));
        assert_eq!(find_icon("Cap", &["cap", "Cap_icon"]), Some("cap"));

        let mut index = IconIndex::default();
        assert!(index.insert("Cap_icon"));
        assert!(!index.insert("cap_icon"));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_primary_with_suffix_uses_base() {
        assert_eq!(find_icon("Cap_icon", &["Cap_icon"]), Some("Cap_icon"));
    }

    #[test]
    fn test_match_icons_keeps_order_and_unmatched() {
        let pairs = match_icons(["Fez", "Cap", "Hat"], ["hat_icon", "Fez_icon"]);
        assert_eq!(pairs.len(), 3);
        assert_eq!(pairs[0].primary, "Fez");
        assert_eq!(pairs[0].icon, Some("Fez_icon"));
        assert_eq!(pairs[1].primary, "Cap");
        assert_eq!(pairs[1].icon, None);
        assert_eq!(pairs[2].icon, Some("hat_icon"));
    }

    #[test]
    fn test_shared_icon_for_duplicate_primaries() {
        let pairs = match_icons(["Fez", "fez"], ["Fez_icon".to_string()]);
        assert!(pairs.iter().all(|p| p.icon.as_deref() == Some("Fez_icon")));
    }

    #[test]
    fn test_non_ascii_name_does_not_panic() {
        assert_eq!(name_base("шляпа"), "шляпа");
        assert_eq!(find_icon("шляпа", &["шляпа_icon"]), Some("шляпа_icon"));
    }
}

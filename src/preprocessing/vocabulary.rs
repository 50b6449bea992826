/// Словари категориальных значений (азербайджанский / русский)

use crate::types::SellerType;

const BUILDING_TYPES: &[(&str, &str)] = &[
    ("Köhnə tikili", "Old building"),
    ("Yeni tikili", "New building"),
    ("Новостройка", "New building"),
    ("Ofis", "Office"),
    ("Офис", "Office"),
    ("Obyekt", "Object"),
    ("Объект", "Object"),
    ("Дом / Дача", "House / Cottage"),
    ("Вторичка", "Secondary"),
    ("Həyət evi / Bağ evi", "House / Garden house"),
    ("Mənzil", "Apartment"),
    ("Участок", "Plot"),
    ("Torpaq", "Land"),
    ("Qaraj", "Garage"),
    ("Гараж", "Garage"),
];

/// Точное (с учётом регистра) сопоставление типа продавца
pub fn seller_type(raw: &str) -> SellerType {
    match raw {
        "vasitəçi (agent)" | "посредник (агент)" => SellerType::Agent,
        "mülkiyyətçi" | "собственник" => SellerType::Owner,
        other => SellerType::Unrecognized(other.to_string()),
    }
}

/// Унифицированная категория здания; `None`, если метка вне словаря
pub fn unified_building_type(raw: &str) -> Option<&'static str> {
    BUILDING_TYPES
        .iter()
        .find(|(label, _)| *label == raw)
        .map(|(_, unified)| *unified)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seller_type_both_languages() {
        assert_eq!(seller_type("vasitəçi (agent)"), SellerType::Agent);
        assert_eq!(seller_type("посредник (агент)"), SellerType::Agent);
        assert_eq!(seller_type("mülkiyyətçi"), SellerType::Owner);
        assert_eq!(seller_type("собственник"), SellerType::Owner);
    }

    #[test]
    fn test_seller_type_is_case_sensitive() {
        assert_eq!(
            seller_type("Собственник"),
            SellerType::Unrecognized("Собственник".to_string())
        );
    }

    #[test]
    fn test_building_types_unify_across_languages() {
        assert_eq!(unified_building_type("Yeni tikili"), Some("New building"));
        assert_eq!(unified_building_type("Новостройка"), Some("New building"));
        assert_eq!(unified_building_type("Qaraj"), Some("Garage"));
        assert_eq!(unified_building_type("Гараж"), Some("Garage"));
        assert_eq!(unified_building_type("Villa"), None);
    }
}

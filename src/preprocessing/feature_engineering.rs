//! Feature engineering для объявлений

use std::collections::BTreeSet;
use std::sync::OnceLock;

use ndarray::{Array1, Array2};
use regex::Regex;

use crate::config::{NullFeaturePolicy, UnknownSellerPolicy};
use crate::error::{PipelineError, Result};
use crate::preprocessing::vocabulary;
use crate::types::{
    CompositeDetails, EngineeredListing, ListingRecord, PreparedData, SellerType, Table,
};

/// Числовые признаки, идущие перед one-hot колонками типа здания
pub const BASE_FEATURES: [&str; 3] = ["view_count", "seller_type_encoded", "is_near_metro"];

pub const BUILDING_TYPE_PREFIX: &str = "building_type_";

const COMPOSITE_SLOTS: usize = 7;

fn view_count_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)(?:Baxışların sayı|Просмотров)\s*:?\s*([0-9]+)")
            .expect("view count pattern is valid")
    })
}

/// Позиции обязательных колонок во входной таблице
struct Columns {
    description: usize,
    view: usize,
    seller_type: usize,
    price: usize,
    building_type: usize,
    all_data: usize,
    location: usize,
    address_all: usize,
}

impl Columns {
    fn resolve(table: &Table) -> Result<Self> {
        Ok(Self {
            description: table.require_column("description")?,
            view: table.require_column("view")?,
            seller_type: table.require_column("seller_type")?,
            price: table.require_column("price")?,
            building_type: table.require_column("building_type")?,
            all_data: table.require_column("all_data")?,
            location: table.require_column("location")?,
            address_all: table.require_column("address_all")?,
        })
    }

    fn record(&self, table: &Table, row: usize) -> ListingRecord {
        let text = |column: usize| table.value(row, column).unwrap_or_default().to_string();
        ListingRecord {
            description: text(self.description),
            view: text(self.view),
            seller_type: text(self.seller_type),
            price: text(self.price),
            building_type: text(self.building_type),
            all_data: text(self.all_data),
            location: text(self.location),
            address_all: text(self.address_all),
        }
    }
}

pub struct FeatureEngineer {
    null_policy: NullFeaturePolicy,
    unknown_seller: UnknownSellerPolicy,
}

impl FeatureEngineer {
    pub fn new(null_policy: NullFeaturePolicy) -> Self {
        Self {
            null_policy,
            unknown_seller: UnknownSellerPolicy::default(),
        }
    }

    pub fn with_unknown_seller(mut self, policy: UnknownSellerPolicy) -> Self {
        self.unknown_seller = policy;
        self
    }

    /// Признаки и цель из очищенной таблицы.
    ///
    /// Строки сортируются по цене (устойчиво) и в этом порядке попадают
    /// в матрицу признаков, цель и `listings`.
    pub fn engineer(&self, table: &Table) -> Result<PreparedData> {
        let columns = Columns::resolve(table)?;

        let mut listings = Vec::with_capacity(table.len());
        let mut unknown_buildings = BTreeSet::new();
        let mut unknown_sellers = BTreeSet::new();
        let mut dropped_views = 0usize;
        let mut dropped_sellers = 0usize;

        for row in 0..table.len() {
            let record = columns.record(table, row);
            let listing = Self::engineer_listing(row, &record)?;

            if vocabulary::unified_building_type(&record.building_type).is_none() {
                unknown_buildings.insert(record.building_type.clone());
            }
            if let SellerType::Unrecognized(raw) = &listing.seller_type {
                match self.unknown_seller {
                    UnknownSellerPolicy::Fail => {
                        return Err(PipelineError::UnrecognizedSeller {
                            row,
                            value: raw.clone(),
                        });
                    }
                    UnknownSellerPolicy::Drop => {
                        unknown_sellers.insert(raw.clone());
                        dropped_sellers += 1;
                        continue;
                    }
                }
            }

            if listing.view_count.is_none() {
                match self.null_policy {
                    NullFeaturePolicy::Fail => {
                        return Err(PipelineError::MissingFeature {
                            row,
                            column: "view_count",
                        });
                    }
                    NullFeaturePolicy::Drop => {
                        dropped_views += 1;
                        continue;
                    }
                }
            }

            listings.push(listing);
        }

        if !unknown_buildings.is_empty() {
            tracing::warn!(
                "Building types outside the vocabulary kept as categories: {:?}",
                unknown_buildings
            );
        }
        if !unknown_sellers.is_empty() {
            tracing::warn!(
                "Dropped {} rows with unrecognized seller types: {:?}",
                dropped_sellers,
                unknown_sellers
            );
        }
        if dropped_views > 0 {
            tracing::warn!("Dropped {} rows without a view count", dropped_views);
        }

        // sort_by устойчив: равные цены сохраняют исходный порядок
        listings.sort_by(|a, b| a.price.total_cmp(&b.price));

        let prepared = assemble(listings);
        tracing::info!(
            "Engineered {} rows x {} features",
            prepared.len(),
            prepared.feature_names.len()
        );
        Ok(prepared)
    }

    /// Признаки одной записи; `row` используется только в сообщениях об ошибках
    pub fn engineer_listing(row: usize, record: &ListingRecord) -> Result<EngineeredListing> {
        let building_type = vocabulary::unified_building_type(&record.building_type)
            .map(str::to_string)
            .unwrap_or_else(|| record.building_type.clone());

        Ok(EngineeredListing {
            view_count: extract_view_count(&record.view),
            seller_type: vocabulary::seller_type(&record.seller_type),
            price: parse_price(row, &record.price)?,
            description_length: record.description.chars().count(),
            building_type,
            details: split_composite(row, &record.all_data)?,
            is_near_metro: is_near_metro(record),
        })
    }
}

impl Default for FeatureEngineer {
    fn default() -> Self {
        Self::new(NullFeaturePolicy::default())
    }
}

/// Первое число после "Baxışların sayı" или "Просмотров"
pub fn extract_view_count(view: &str) -> Option<u64> {
    view_count_pattern()
        .captures(view)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Цена без разделителей разрядов: "1 234 567" -> 1234567.0
pub fn parse_price(row: usize, raw: &str) -> Result<f64> {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    compact
        .parse::<f64>()
        .ok()
        .filter(|price| price.is_finite())
        .ok_or_else(|| PipelineError::PriceParse {
            row,
            value: raw.to_string(),
        })
}

/// Строгое разбиение `all_data` ровно на семь слотов
pub fn split_composite(row: usize, raw: &str) -> Result<CompositeDetails> {
    let parts: Vec<&str> = raw.split(',').collect();
    let [property_type, floor_info, area, room_count, data_1, data_2, data_3] =
        <[&str; COMPOSITE_SLOTS]>::try_from(parts.as_slice()).map_err(|_| {
            PipelineError::CompositeShape {
                row,
                found: parts.len(),
            }
        })?;

    Ok(CompositeDetails {
        property_type: property_type.to_string(),
        floor_info: floor_info.to_string(),
        area: area.to_string(),
        room_count: room_count.to_string(),
        data_1: data_1.to_string(),
        data_2: data_2.to_string(),
        data_3: data_3.to_string(),
    })
}

pub fn is_near_metro(record: &ListingRecord) -> bool {
    [&record.location, &record.address_all, &record.description]
        .iter()
        .any(|field| {
            let field = field.to_lowercase();
            field.contains("m.") || field.contains("metro")
        })
}

fn assemble(listings: Vec<EngineeredListing>) -> PreparedData {
    let categories: Vec<String> = listings
        .iter()
        .map(|l| l.building_type.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let feature_names: Vec<String> = BASE_FEATURES
        .iter()
        .map(|name| name.to_string())
        .chain(
            categories
                .iter()
                .map(|c| format!("{BUILDING_TYPE_PREFIX}{c}")),
        )
        .collect();

    let n_base = BASE_FEATURES.len();
    let mut features = Array2::zeros((listings.len(), feature_names.len()));

    for (i, listing) in listings.iter().enumerate() {
        features[[i, 0]] = listing.view_count.map_or(f64::NAN, |v| v as f64);
        features[[i, 1]] = listing
            .seller_type
            .encoded()
            .map_or(f64::NAN, f64::from);
        features[[i, 2]] = if listing.is_near_metro { 1.0 } else { 0.0 };

        if let Ok(pos) = categories.binary_search(&listing.building_type) {
            features[[i, n_base + pos]] = 1.0;
        }
    }

    let target: Array1<f64> = listings.iter().map(|l| l.price).collect();
    debug_assert_eq!(features.nrows(), target.len());

    PreparedData {
        feature_names,
        features,
        target,
        listings,
    }
}

use crate::error::{Error, error::DataConversionSnafu};
use geo::Geometry;
use geozero::wkb;
use sqlx::{FromRow, types::Json};
use trawlwatch_core::{ZoneCategory, ZoneId};

#[derive(FromRow)]
pub struct Zone {
    pub zone_id: ZoneId,
    pub category: String,
    pub sub_category: Option<String>,
    pub name: String,
    pub geometry: wkb::Decode<Geometry<f64>>,
    pub beneficiaries: Json<Vec<String>>,
}

impl TryFrom<Zone> for trawlwatch_core::Zone {
    type Error = Error;

    fn try_from(v: Zone) -> Result<Self, Self::Error> {
        let geometry = v.geometry.geometry.ok_or_else(|| {
            DataConversionSnafu {
                description: format!("zone {} has no geometry", v.zone_id),
            }
            .build()
        })?;

        Ok(Self {
            id: v.zone_id,
            category: ZoneCategory::from(v.category),
            sub_category: v.sub_category,
            name: v.name,
            geometry,
            beneficiaries: v.beneficiaries.0,
        })
    }
}

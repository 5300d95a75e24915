//! Demo queryer serving seeded random points and lines.
//!
//! At construction it generates `count` points and `count` two-point lines
//! inside `[100, 120] x [20, 30]`, indexes them, and answers every query from
//! the index. Table files select it with `"impl": "random_features"`; the
//! optional `initParam` keys `count` and `seed` override the defaults.

use crate::config::TableConfig;
use crate::error::{GeoRewriteError, Result};
use crate::index::PrTreeIndex;
use crate::queryer::{
    ColumnGetter, Queryer, RowContext, TableSchema, build_result_set, parse_column_part,
    pg_to_extent,
};
use crate::result_set::{ResultSet, Value};
use bytes::Bytes;
use geo::{Coord, Geometry, LineString, Point};
use geozero::{CoordDimensions, ToWkb};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[derive(Debug, Clone, PartialEq)]
pub struct DemoFeature {
    pub id: i32,
    pub name: String,
    pub value: f64,
    /// Geometry as well-known binary.
    pub wkb: Bytes,
}

#[derive(Debug)]
pub struct RandomFeatureQueryer {
    table: String,
    schema: TableSchema,
    index: PrTreeIndex<DemoFeature>,
}

impl RandomFeatureQueryer {
    pub const IMPLEMENTATION: &'static str = "random_features";
    pub const DEFAULT_COUNT: usize = 10_000;
    pub const DEFAULT_SEED: u64 = 233;

    /// Generates `count` points and `count` lines from `seed`.
    pub fn new(table: impl Into<String>, schema: TableSchema, count: usize, seed: u64) -> Result<Self> {
        if count > (i32::MAX as usize) / 2 {
            return Err(GeoRewriteError::Config(format!(
                "feature count {count} exceeds the 32-bit id range"
            )));
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let mut features = Vec::with_capacity(count * 2);
        let mut geometries = Vec::with_capacity(count * 2);

        for i in 0..count * 2 {
            let value = rng.gen_range(0.0..1.0);
            let (name, geometry) = if i < count {
                let point = Point::from(random_coord(&mut rng));
                (format!("point-{i}"), Geometry::Point(point))
            } else {
                let line = LineString::new(vec![random_coord(&mut rng), random_coord(&mut rng)]);
                (format!("LINE-{i}"), Geometry::LineString(line))
            };
            let wkb = geometry.to_wkb(CoordDimensions::xy())?;
            features.push(DemoFeature {
                id: i as i32,
                name,
                value,
                wkb: Bytes::from(wkb),
            });
            geometries.push(geometry);
        }

        let index =
            PrTreeIndex::from_geometries(features, |f| geometries.get(f.id as usize))?;

        Ok(Self {
            table: table.into(),
            schema,
            index,
        })
    }

    pub fn from_config(config: &TableConfig) -> Result<Self> {
        if let Some(param) = &config.init_param {
            log::info!("Init param for {}: {}", config.table_name, param);
        }
        let count = config
            .init_param_u64("count")
            .map_or(Self::DEFAULT_COUNT, |c| c as usize);
        let seed = config.init_param_u64("seed").unwrap_or(Self::DEFAULT_SEED);
        Self::new(config.table_name.clone(), config.schema(), count, seed)
    }

    pub fn index(&self) -> &PrTreeIndex<DemoFeature> {
        &self.index
    }

    /// Resolves the column-name dispatch once per query.
    fn getters(columns: &[String]) -> Vec<ColumnGetter<DemoFeature>> {
        columns
            .iter()
            .map(|column| -> ColumnGetter<DemoFeature> {
                match column.as_str() {
                    "SHAPE" => Box::new(|f: &DemoFeature, _: &RowContext<'_>| {
                        Value::Binary(f.wkb.clone())
                    }),
                    "VALUE" => Box::new(|f: &DemoFeature, _: &RowContext<'_>| Value::Double(f.value)),
                    "NAME" => Box::new(|f: &DemoFeature, _: &RowContext<'_>| {
                        Value::Text(f.name.clone())
                    }),
                    "TCODE" => Box::new(|_: &DemoFeature, ctx: &RowContext<'_>| {
                        Value::Text(ctx.tcode.to_string())
                    }),
                    _ => Box::new(|f: &DemoFeature, _: &RowContext<'_>| Value::Integer(f.id)),
                }
            })
            .collect()
    }
}

fn random_coord(rng: &mut StdRng) -> Coord<f64> {
    Coord {
        x: 100.0 + rng.gen_range(0.0..20.0),
        y: 20.0 + rng.gen_range(0.0..10.0),
    }
}

impl Queryer for RandomFeatureQueryer {
    fn table_name(&self) -> &str {
        &self.table
    }

    fn schema(&self) -> &TableSchema {
        &self.schema
    }

    fn query(&self, column_part: &str, fun: &str, pg: &str) -> Result<ResultSet> {
        let columns = parse_column_part(column_part);
        let mut rs = build_result_set(&self.table, &columns, &self.schema)?;
        let getters = Self::getters(&columns);
        let extent = pg_to_extent(pg)?;
        let ctx = RowContext { tcode: fun };

        self.index.try_query_env_intersect(
            extent.min_x(),
            extent.min_y(),
            extent.max_x(),
            extent.max_y(),
            |feature| rs.add_row(getters.iter().map(|get| get(feature, &ctx)).collect()),
        )?;
        Ok(rs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queryer::{ColumnDefinition, ColumnType};

    fn schema() -> TableSchema {
        TableSchema::new(vec![
            ColumnDefinition::new("SHAPE", ColumnType::Geometry, 0, 0),
            ColumnDefinition::new("NAME", ColumnType::Varchar, 50, 0),
            ColumnDefinition::new("VALUE", ColumnType::Numeric, 10, 4),
        ])
    }

    #[test]
    fn test_generates_points_and_lines() {
        let q = RandomFeatureQueryer::new("POINTS", schema(), 50, 233).unwrap();
        assert_eq!(q.index().len(), 100);
        let bounds = q.index().bounds().unwrap();
        assert!(bounds.min_x() >= 100.0 && bounds.max_x() <= 120.0);
        assert!(bounds.min_y() >= 20.0 && bounds.max_y() <= 30.0);
    }

    #[test]
    fn test_query_shapes_rows() {
        let q = RandomFeatureQueryer::new("POINTS", schema(), 20, 1).unwrap();
        let rs = q
            .query(
                r#""fid","SHAPE" as "SHAPE","NAME","TCODE""#,
                "BS",
                "POLYGON ((90 10, 90 40, 130 40, 130 10, 90 10))",
            )
            .unwrap();
        assert_eq!(rs.len(), 40);
        for row in rs.rows() {
            assert!(matches!(row[0], Value::Integer(_)));
            match &row[1] {
                // byte order marker, then geometry type 1 (point) or 2 (line)
                Value::Binary(wkb) => assert!(wkb.len() > 5 && (wkb[1] == 1 || wkb[1] == 2)),
                other => panic!("expected WKB, got {other:?}"),
            }
            assert_eq!(row[3], Value::Text("BS".into()));
        }
    }

    #[test]
    fn test_query_outside_range_is_empty() {
        let q = RandomFeatureQueryer::new("POINTS", schema(), 20, 1).unwrap();
        let rs = q
            .query(r#""fid""#, "", "POLYGON ((0 0, 0 1, 1 1, 1 0, 0 0))")
            .unwrap();
        assert!(rs.is_empty());
        assert_eq!(rs.columns().len(), 1);
    }

    #[test]
    fn test_undeclared_column_fails_query() {
        let q = RandomFeatureQueryer::new("POINTS", schema(), 1, 1).unwrap();
        assert!(matches!(
            q.query(r#""WIDTH""#, "", "POLYGON ((0 0, 0 1, 1 1, 1 0, 0 0))"),
            Err(GeoRewriteError::UnknownColumn { .. })
        ));
    }
}

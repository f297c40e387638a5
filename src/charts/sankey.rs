//! CPI Sankey
//! Flows from macro drivers through CPI sectors to headline CPI and its economic impact.

use crate::charts::ChartError;
use crate::data::{CsvTable, TableSchema, ValueColumns};
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, warn};

const NODE_CAUSE: &str = "#0d1f26";
const NODE_SECTOR: &str = "#2d5f73";
const NODE_TOTAL: &str = "#d68910";
const NODE_CONSEQUENCE: &str = "#c0392b";
const LINK_POSITIVE: &str = "rgba(46, 204, 113, 0.45)";
const LINK_NEGATIVE: &str = "rgba(231, 76, 60, 0.45)";
const LINK_NEUTRAL: &str = "rgba(120, 144, 156, 0.4)";

const HEADLINE: &str = "Headline CPI";
const MIN_CAUSE_WIDTH: f64 = 0.15;

/// Round to two decimals on the exact decimal value of `x`.
///
/// `3.155` is stored as `3.15499...` and rounds to `3.15`. Exact halves
/// (multiples of 1/8) round away from zero.
pub fn round2(x: f64) -> f64 {
    let eighths = x * 8.0;
    if eighths.fract() == 0.0 && eighths % 2.0 != 0.0 {
        return (x * 100.0).round() / 100.0;
    }
    format!("{x:.2}").parse().unwrap_or(x)
}

/// Shortest decimal form of `round2(x)`, never `-0`.
fn display2(x: f64) -> String {
    let r = round2(x);
    if r == 0.0 {
        "0".to_string()
    } else {
        r.to_string()
    }
}

/// `+1.25%`, `-0.5%`, `0%`.
pub fn format_pct(x: f64) -> String {
    let sign = if x > 0.0 { "+" } else { "" };
    format!("{sign}{}%", display2(x))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sector {
    pub key: String,
    pub name: String,
    pub weight: f64,
    pub change: f64,
    /// Contribution to headline CPI, percentage points.
    pub contrib: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MacroYear {
    pub headline_cpi: f64,
    pub gdp: f64,
    pub unemployment: f64,
    pub real_wage_loss: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Cause,
    Sector,
    Headline,
    Consequence,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SankeyNode {
    pub label: String,
    pub kind: NodeKind,
    pub color: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SankeyLink {
    pub source: usize,
    pub target: usize,
    pub value: f64,
    pub color: &'static str,
    pub hover: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Neutral,
    Positive,
    Negative,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryMetric {
    pub label: &'static str,
    pub value: f64,
    pub display: String,
    pub tone: Tone,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SankeyDiagram {
    pub year: String,
    pub nodes: Vec<SankeyNode>,
    pub links: Vec<SankeyLink>,
    pub summary: Vec<SummaryMetric>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Up,
    Down,
    Neutral,
}

impl Trend {
    fn of(delta: f64) -> Self {
        if delta.abs() < 0.01 {
            Trend::Neutral
        } else if delta > 0.0 {
            Trend::Up
        } else {
            Trend::Down
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonRow {
    pub name: String,
    /// `None` on the headline row.
    pub base_weight: Option<f64>,
    pub base_change: f64,
    pub compare_weight: Option<f64>,
    pub compare_change: f64,
    pub delta: f64,
    pub delta_display: String,
    pub trend: Trend,
}

impl ComparisonRow {
    fn new(
        name: &str,
        base: (Option<f64>, f64),
        compare: (Option<f64>, f64),
    ) -> Self {
        let delta = compare.1 - base.1;
        Self {
            name: name.to_string(),
            base_weight: base.0,
            base_change: base.1,
            compare_weight: compare.0,
            compare_change: compare.1,
            delta,
            delta_display: format_pct(delta),
            trend: Trend::of(delta),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectorComparison {
    pub base_year: String,
    pub compare_year: String,
    pub rows: Vec<ComparisonRow>,
    pub total: ComparisonRow,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendItem {
    pub label: &'static str,
    pub color: &'static str,
}

/// Output document: one diagram per year plus the sector table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SankeyChart {
    pub title: String,
    pub default_year: String,
    pub diagrams: Vec<SankeyDiagram>,
    pub comparison: Option<SectorComparison>,
    pub legend: Vec<LegendItem>,
}

/// Sectors, macro indicators and cause-to-sector ratios, keyed by year.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SankeyModel {
    sectors: BTreeMap<String, Vec<Sector>>,
    macros: BTreeMap<String, MacroYear>,
    /// cause -> sector key -> ratio, in file order.
    io: IndexMap<String, IndexMap<String, f64>>,
}

impl SankeyModel {
    /// `year,key,name,weight,change,contrib`
    pub fn sectors_schema() -> TableSchema {
        TableSchema::new(
            ["year", "key", "name"],
            ValueColumns::Named(vec!["weight".into(), "change".into(), "contrib".into()]),
        )
    }

    /// `year,headline_cpi,gdp,unemp,real_wage_loss`
    pub fn macro_schema() -> TableSchema {
        TableSchema::new(
            ["year"],
            ValueColumns::Named(vec![
                "headline_cpi".into(),
                "gdp".into(),
                "unemp".into(),
                "real_wage_loss".into(),
            ]),
        )
    }

    /// `cause,sector_key,ratio`
    pub fn io_schema() -> TableSchema {
        TableSchema::new(["cause", "sector_key"], ValueColumns::Named(vec!["ratio".into()]))
    }

    /// Rows missing a field are skipped with a warning.
    pub fn from_tables(sectors: &CsvTable, macros: &CsvTable, io: &CsvTable) -> Self {
        let mut model = Self::default();

        for row in &sectors.rows {
            let parsed = (|| {
                let sector = Sector {
                    key: row.text("key")?.to_string(),
                    name: row.text("name")?.to_string(),
                    weight: row.number("weight")?,
                    change: row.number("change")?,
                    contrib: row.number("contrib")?,
                };
                Some((row.text("year")?.to_string(), sector))
            })();
            match parsed {
                Some((year, sector)) => model.sectors.entry(year).or_default().push(sector),
                None => warn!(?row, "incomplete sector row skipped"),
            }
        }

        for row in &macros.rows {
            let parsed = (|| {
                let values = MacroYear {
                    headline_cpi: row.number("headline_cpi")?,
                    gdp: row.number("gdp")?,
                    unemployment: row.number("unemp")?,
                    real_wage_loss: row.number("real_wage_loss")?,
                };
                Some((row.text("year")?.to_string(), values))
            })();
            match parsed {
                Some((year, values)) => {
                    model.macros.insert(year, values);
                }
                None => warn!(?row, "incomplete macro row skipped"),
            }
        }

        for row in &io.rows {
            match (row.text("cause"), row.text("sector_key"), row.number("ratio")) {
                (Some(cause), Some(sector), Some(ratio)) => {
                    model
                        .io
                        .entry(cause.to_string())
                        .or_default()
                        .insert(sector.to_string(), ratio);
                }
                _ => warn!(?row, "incomplete io mapping row skipped"),
            }
        }

        debug!(
            years = model.sectors.len(),
            causes = model.io.len(),
            "built sankey model"
        );
        model
    }

    /// Years with both sector and macro data, ascending.
    pub fn years(&self) -> Vec<String> {
        self.sectors
            .keys()
            .filter(|y| self.macros.contains_key(*y))
            .cloned()
            .collect()
    }

    fn year_data(&self, year: &str) -> Result<(&[Sector], &MacroYear), ChartError> {
        match (self.sectors.get(year), self.macros.get(year)) {
            (Some(s), Some(m)) => Ok((s, m)),
            _ => Err(ChartError::MissingYear(year.to_string())),
        }
    }

    pub fn build(&self, year: &str) -> Result<SankeyDiagram, ChartError> {
        let (sectors, m) = self.year_data(year)?;

        let mut nodes: Vec<SankeyNode> = Vec::new();
        let mut push = |label: String, kind: NodeKind, color: &'static str| {
            nodes.push(SankeyNode { label, kind, color });
            nodes.len() - 1
        };

        let cause_idx: IndexMap<&str, usize> = self
            .io
            .keys()
            .map(|c| (c.as_str(), push(c.clone(), NodeKind::Cause, NODE_CAUSE)))
            .collect();
        let sector_idx: IndexMap<&str, usize> = sectors
            .iter()
            .map(|s| {
                let label = format!("{} {}", s.name, format_pct(s.contrib));
                (s.key.as_str(), push(label, NodeKind::Sector, NODE_SECTOR))
            })
            .collect();
        let headline = push(
            format!("{HEADLINE} {}%", display2(m.headline_cpi)),
            NodeKind::Headline,
            NODE_TOTAL,
        );

        let consequences = [
            ("GDP Growth", m.gdp, format_pct(m.gdp)),
            ("Unemployment", m.unemployment, format!("{}%", display2(m.unemployment))),
            ("Real Wage Loss", m.real_wage_loss, format_pct(m.real_wage_loss)),
        ];
        let consequence_idx: Vec<usize> = consequences
            .iter()
            .map(|(label, _, shown)| {
                push(format!("{label} {shown}"), NodeKind::Consequence, NODE_CONSEQUENCE)
            })
            .collect();

        let mut links = Vec::new();

        for (cause, targets) in &self.io {
            for (sector_key, ratio) in targets {
                let Some(sector) = sectors.iter().find(|s| &s.key == sector_key) else {
                    continue;
                };
                links.push(SankeyLink {
                    source: cause_idx[cause.as_str()],
                    target: sector_idx[sector.key.as_str()],
                    value: (sector.contrib.abs() * ratio * 5.0).max(MIN_CAUSE_WIDTH),
                    color: LINK_NEUTRAL,
                    hover: format!(
                        "{cause} → {}<br>Impact: {}%",
                        sector.name,
                        (ratio * 100.0).round()
                    ),
                });
            }
        }

        let mut sector_width = 0.0;
        for s in sectors {
            let width = s.contrib.abs() * 4.0;
            sector_width += width;
            links.push(SankeyLink {
                source: sector_idx[s.key.as_str()],
                target: headline,
                value: width,
                color: if s.contrib > 0.0 { LINK_POSITIVE } else { LINK_NEGATIVE },
                hover: format!(
                    "{}<br>Weight: {}%<br>Price Change: {}<br>CPI Contribution: {}",
                    s.name,
                    display2(s.weight),
                    format_pct(s.change),
                    format_pct(s.contrib)
                ),
            });
        }

        let total_mag = match consequences.iter().map(|(_, v, _)| v.abs()).sum::<f64>() {
            t if t == 0.0 => 1.0,
            t => t,
        };
        for ((label, value, shown), target) in consequences.iter().zip(&consequence_idx) {
            let share = value.abs() / total_mag;
            links.push(SankeyLink {
                source: headline,
                target: *target,
                value: share * sector_width,
                color: LINK_NEUTRAL,
                hover: format!(
                    "{HEADLINE} → {label}<br>Value: {shown}<br>Share of Impact: {}%",
                    (share * 100.0).round()
                ),
            });
        }

        Ok(SankeyDiagram {
            year: year.to_string(),
            nodes,
            links,
            summary: Self::summary(m),
        })
    }

    fn summary(m: &MacroYear) -> Vec<SummaryMetric> {
        let metric = |label, value: f64, display: String, tone| SummaryMetric {
            label,
            value,
            display,
            tone,
        };
        vec![
            metric(HEADLINE, m.headline_cpi, format_pct(m.headline_cpi), Tone::Neutral),
            metric("GDP Growth", m.gdp, format_pct(m.gdp), Tone::Positive),
            metric("Real Wage Loss", m.real_wage_loss, format_pct(m.real_wage_loss), Tone::Negative),
            metric(
                "Unemployment",
                m.unemployment,
                format!("{}%", display2(m.unemployment)),
                Tone::Neutral,
            ),
        ]
    }

    /// Sector price changes between two years, matched by sector key.
    pub fn compare(&self, base_year: &str, compare_year: &str) -> Result<SectorComparison, ChartError> {
        let (base, base_macro) = self.year_data(base_year)?;
        let (other, other_macro) = self.year_data(compare_year)?;

        let rows = base
            .iter()
            .filter_map(|b| {
                let c = other.iter().find(|c| c.key == b.key)?;
                Some(ComparisonRow::new(
                    &b.name,
                    (Some(b.weight), b.change),
                    (Some(c.weight), c.change),
                ))
            })
            .collect();

        Ok(SectorComparison {
            base_year: base_year.to_string(),
            compare_year: compare_year.to_string(),
            rows,
            total: ComparisonRow::new(
                "HEADLINE CPI",
                (None, base_macro.headline_cpi),
                (None, other_macro.headline_cpi),
            ),
        })
    }

    /// Diagrams for `years` (every available year when empty).
    pub fn chart(
        &self,
        title: &str,
        years: &[String],
        default_year: &str,
        comparison: Option<(&str, &str)>,
    ) -> Result<SankeyChart, ChartError> {
        let years = if years.is_empty() { self.years() } else { years.to_vec() };
        let diagrams = years
            .iter()
            .map(|y| self.build(y))
            .collect::<Result<Vec<_>, _>>()?;
        if !diagrams.iter().any(|d| d.year == default_year) {
            return Err(ChartError::MissingYear(default_year.to_string()));
        }

        let comparison = comparison
            .map(|(base, other)| self.compare(base, other))
            .transpose()?;

        Ok(SankeyChart {
            title: title.to_string(),
            default_year: default_year.to_string(),
            diagrams,
            comparison,
            legend: vec![
                LegendItem {
                    label: "Inflationary Pressure",
                    color: "rgba(46, 204, 113, 0.7)",
                },
                LegendItem {
                    label: "Deflationary Pressure",
                    color: "rgba(231, 76, 60, 0.7)",
                },
                LegendItem {
                    label: "Neutral Flow",
                    color: "rgba(120, 144, 156, 0.65)",
                },
            ],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DataLoader;
    use approx::assert_relative_eq;

    const SECTORS: &str = "\
year,key,name,weight,change,contrib
2021,food,Food,33.56,-1.2,-0.4
2021,transport,Transport,9.67,9.8,0.95
2022,food,Food,33.56,2.1,0.7
2022,transport,Transport,9.67,10.1,0.98
2022,edu,Education,5.99,,0.1
";
    const MACRO: &str = "\
year,headline_cpi,gdp,unemp,real_wage_loss
2021,1.84,2.58,3.2,-0.5
2022,3.15,8.02,2.32,-1.5
";
    const IO: &str = "\
cause,sector_key,ratio
Global Energy Prices,transport,0.6
Global Inflation,food,0.3
Global Inflation,housing,0.2
";

    fn model() -> SankeyModel {
        let sectors = DataLoader::parse_text(SECTORS, &SankeyModel::sectors_schema()).unwrap();
        let macros = DataLoader::parse_text(MACRO, &SankeyModel::macro_schema()).unwrap();
        let io = DataLoader::parse_text(IO, &SankeyModel::io_schema()).unwrap();
        SankeyModel::from_tables(&sectors, &macros, &io)
    }

    #[test]
    fn percent_formatting() {
        assert_eq!(format_pct(3.0), "+3%");
        assert_eq!(format_pct(-1.234), "-1.23%");
        assert_eq!(format_pct(0.0), "0%");
        assert_eq!(format_pct(-0.001), "0%");
        assert_eq!(round2(2.345_1), 2.35);
    }

    #[test]
    fn rounding_follows_the_stored_decimal() {
        assert_eq!(round2(3.155), 3.15);
        assert_eq!(round2(8.015), 8.01);
        assert_eq!(format_pct(3.155), "+3.15%");
        assert_eq!(format_pct(8.015), "+8.01%");
        assert_eq!(round2(0.125), 0.13);
        assert_eq!(round2(-0.375), -0.38);
        assert_eq!(round2(2.0), 2.0);
    }

    #[test]
    fn diagram_nodes_and_links() {
        let d = model().build("2022").unwrap();
        let labels: Vec<&str> = d.nodes.iter().map(|n| n.label.as_str()).collect();
        assert_eq!(
            labels,
            vec![
                "Global Energy Prices",
                "Global Inflation",
                "Food +0.7%",
                "Transport +0.98%",
                "Headline CPI 3.15%",
                "GDP Growth +8.02%",
                "Unemployment 2.32%",
                "Real Wage Loss -1.5%",
            ]
        );

        // Two cause links (housing has no sector), two sector links, three consequences.
        assert_eq!(d.links.len(), 7);
        assert_eq!((d.links[0].source, d.links[0].target), (0, 3));
        assert_relative_eq!(d.links[0].value, 0.98 * 0.6 * 5.0);
        assert_relative_eq!(d.links[1].value, 0.7 * 0.3 * 5.0);

        let sector_total = (0.7 + 0.98) * 4.0;
        assert_relative_eq!(d.links[2].value, 0.7 * 4.0);
        assert_eq!(d.links[2].color, LINK_POSITIVE);

        let consequence_sum: f64 = d.links[4..].iter().map(|l| l.value).sum();
        assert_relative_eq!(consequence_sum, sector_total, epsilon = 1e-9);
        assert_relative_eq!(d.links[4].value, 8.02 / (8.02 + 2.32 + 1.5) * sector_total);
    }

    #[test]
    fn tiny_cause_flows_keep_a_minimum_width() {
        let sectors = DataLoader::parse_text(
            "year,key,name,weight,change,contrib\n2022,food,Food,30,0.1,0.01\n",
            &SankeyModel::sectors_schema(),
        )
        .unwrap();
        let macros = DataLoader::parse_text(
            "year,headline_cpi,gdp,unemp,real_wage_loss\n2022,0,0,0,0\n",
            &SankeyModel::macro_schema(),
        )
        .unwrap();
        let io = DataLoader::parse_text(
            "cause,sector_key,ratio\nCredit Policy,food,0.1\n",
            &SankeyModel::io_schema(),
        )
        .unwrap();
        let d = SankeyModel::from_tables(&sectors, &macros, &io).build("2022").unwrap();
        assert_eq!(d.links[0].value, MIN_CAUSE_WIDTH);
        assert_eq!(d.links[1].color, LINK_POSITIVE);
        assert!(d.links[2..].iter().all(|l| l.value == 0.0));
    }

    #[test]
    fn comparison_table() {
        let c = model().compare("2021", "2022").unwrap();
        assert_eq!(c.rows.len(), 2);
        assert_eq!(c.rows[0].name, "Food");
        assert_relative_eq!(c.rows[0].delta, 3.3, epsilon = 1e-9);
        assert_eq!(c.rows[0].trend, Trend::Up);
        assert_eq!(c.rows[1].delta_display, "+0.3%");
        assert_eq!(c.total.base_weight, None);
        assert_eq!(c.total.trend, Trend::Up);
        assert_eq!(Trend::of(0.005), Trend::Neutral);
        assert_eq!(Trend::of(-0.5), Trend::Down);
    }

    #[test]
    fn missing_year() {
        let err = model().build("2019").unwrap_err();
        assert!(matches!(err, ChartError::MissingYear(y) if y == "2019"));
    }

    #[test]
    fn chart_covers_available_years() {
        let chart = model()
            .chart("CPI flows", &[], "2022", Some(("2021", "2022")))
            .unwrap();
        let years: Vec<&str> = chart.diagrams.iter().map(|d| d.year.as_str()).collect();
        assert_eq!(years, vec!["2021", "2022"]);
        assert!(chart.comparison.is_some());
        assert_eq!(chart.diagrams[1].summary[0].display, "+3.15%");
    }
}

//! Fluent query builder
//!
//! A [`Builder`] is bound to one [`Model`]. Predicate, sort, highlight,
//! projection and aggregation calls mutate its state; terminal operations
//! compile that state into a [`SearchRequest`], send it through the model's
//! transport and turn the hits back into records.

use crate::model::Model;
use crate::paginator::Paginator;
use crate::query::operator::{self, Bucket, Operator};
use crate::query::types::{
    Aggregation, Highlight, QueryBody, SearchBody, SearchRequest, SortClause, SortOrder,
    TrackTotalHits,
};
use crate::response::{Hit, SearchResponse};
use crate::transport::Method;
use crate::{Error, Result};
use serde_json::{json, Map, Value};
use tracing::debug;

/// Hits returned by [`Builder::get`] unless [`Builder::take`] says otherwise
pub const DEFAULT_TAKE: usize = 50;

/// Geo point field used when callers don't name one
pub const DEFAULT_GEO_FIELD: &str = "coordinate";

/// Geo filter radius in metres used when callers don't give one
pub const DEFAULT_GEO_DISTANCE: u32 = 2000;

/// Attribute carrying the relevance score on paged records
pub const HIT_SCORE: &str = "hit_score";

#[derive(Debug, Clone)]
pub struct Builder<'m> {
    model: &'m Model,
    query: QueryBody,
    sort: Vec<SortClause>,
    highlight: Highlight,
    source: Vec<String>,
    aggs: Map<String, Value>,
    take: usize,
}

impl<'m> Builder<'m> {
    pub fn new(model: &'m Model) -> Self {
        Self {
            model,
            query: QueryBody::default(),
            sort: Vec::new(),
            highlight: Highlight::default(),
            source: Vec::new(),
            aggs: Map::new(),
            take: DEFAULT_TAKE,
        }
    }

    pub fn model(&self) -> &'m Model {
        self.model
    }

    // ========================================================================
    // Predicates
    // ========================================================================

    /// Exact term match, `field = value`
    pub fn where_eq(&mut self, field: &str, value: impl Into<Value>) -> &mut Self {
        self.query
            .bool_query
            .push(Bucket::Must, operator::term(field, value.into()));
        self
    }

    /// Predicate with a textual operator such as `">="` or `"not in"`
    pub fn where_op(&mut self, field: &str, op: &str, value: impl Into<Value>) -> Result<&mut Self> {
        let op: Operator = op.parse()?;
        self.where_operator(field, op, value)
    }

    pub fn where_operator(
        &mut self,
        field: &str,
        op: Operator,
        value: impl Into<Value>,
    ) -> Result<&mut Self> {
        let (bucket, clause) = operator::translate(field, op, value.into())?;
        self.query.bool_query.push(bucket, clause);
        Ok(self)
    }

    pub fn where_in<I, V>(&mut self, field: &str, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values = values.into_iter().map(Into::into).collect::<Vec<Value>>();
        self.query
            .bool_query
            .push(Bucket::Must, operator::terms(field, Value::Array(values)));
        self
    }

    pub fn where_not_in<I, V>(&mut self, field: &str, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values = values.into_iter().map(Into::into).collect::<Vec<Value>>();
        self.query
            .bool_query
            .push(Bucket::MustNot, operator::terms(field, Value::Array(values)));
        self
    }

    /// Analyzed full-text match
    pub fn where_like(&mut self, field: &str, value: impl Into<Value>) -> &mut Self {
        self.query
            .bool_query
            .push(Bucket::Must, operator::full_text(field, value.into()));
        self
    }

    /// Inclusive range, `low <= field <= high`
    pub fn where_between(
        &mut self,
        field: &str,
        low: impl Into<Value>,
        high: impl Into<Value>,
    ) -> &mut Self {
        self.query.bool_query.push(
            Bucket::Must,
            operator::inclusive_range(field, low.into(), high.into()),
        );
        self
    }

    /// Disjunction over several conditions on one field
    ///
    /// ```ignore
    /// builder.where_or("price", [("=", json!(1)), (">", json!(5))])?;
    /// ```
    pub fn where_or<I, O, V>(&mut self, field: &str, conditions: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = (O, V)>,
        O: AsRef<str>,
        V: Into<Value>,
    {
        let conditions = conditions
            .into_iter()
            .map(|(op, value)| Ok((op.as_ref().parse::<Operator>()?, value.into())))
            .collect::<Result<Vec<_>>>()?;
        let clause = operator::disjunction(field, conditions)?;
        self.query.bool_query.push(Bucket::Must, clause);
        Ok(self)
    }

    /// Caller-built clause, added to `must` as is
    pub fn where_raw(&mut self, clause: Value) -> &mut Self {
        self.query.bool_query.push(Bucket::Must, clause);
        self
    }

    /// Caller-built clause in the root `should` bucket
    pub fn where_should(&mut self, clause: Value) -> &mut Self {
        self.query.bool_query.push(Bucket::Should, clause);
        self
    }

    /// Wrap the compiled query in a `function_score` envelope
    pub fn where_function_score(&mut self, spec: Map<String, Value>) -> &mut Self {
        self.query.function_score = Some(spec);
        self
    }

    /// Keep documents within `distance_meters` of a point
    pub fn geo(&mut self, lat: f64, lng: f64, field: &str, distance_meters: u32) -> &mut Self {
        self.query.bool_query.push(
            Bucket::Filter,
            json!({
                "geo_distance": {
                    "distance": format!("{}m", distance_meters),
                    field: {"lat": lat, "lon": lng}
                }
            }),
        );
        self
    }

    /// `match` leaf, replaces any earlier one on the same field
    pub fn match_field(&mut self, field: &str, value: impl Into<Value>) -> &mut Self {
        self.query.matches.insert(field.to_string(), value.into());
        self
    }

    /// `match_phrase` leaf, replaces any earlier one on the same field
    pub fn match_phrase(&mut self, field: &str, value: impl Into<Value>) -> &mut Self {
        self.query.match_phrases.insert(field.to_string(), value.into());
        self
    }

    // ========================================================================
    // Shaping
    // ========================================================================

    /// Restrict returned `_source` fields
    pub fn select<I, S>(&mut self, fields: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.source = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Highlight the named fields with default options
    pub fn highlight<I, S>(&mut self, fields: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields = fields
            .into_iter()
            .map(|name| (name.into(), json!({})))
            .collect::<Map<String, Value>>();
        self.highlight_with(fields)
    }

    /// Highlight with per-field options
    pub fn highlight_with(&mut self, fields: Map<String, Value>) -> &mut Self {
        self.highlight = Highlight { fields };
        self
    }

    pub fn order_by(&mut self, field: &str, desc: bool) -> &mut Self {
        self.order_by_with(field, desc, Map::new())
    }

    /// Field sort with extra directive options such as `missing` or `mode`
    pub fn order_by_with(&mut self, field: &str, desc: bool, extra: Map<String, Value>) -> &mut Self {
        self.sort.push(SortClause::Field {
            field: field.to_string(),
            order: SortOrder::from_desc(desc),
            options: extra,
        });
        self
    }

    /// Caller-built sort directive
    pub fn order_by_script(&mut self, directive: Value) -> &mut Self {
        self.sort.push(SortClause::Raw(directive));
        self
    }

    /// Sort by distance from a point, in metres
    pub fn order_by_geo(&mut self, lat: f64, lng: f64, field: &str, order: SortOrder) -> &mut Self {
        self.sort.push(SortClause::GeoDistance {
            field: field.to_string(),
            lat,
            lon: lng,
            order,
        });
        self
    }

    /// Rank documents by the position of `field` in `ids`
    ///
    /// Ids are compared as integers. Documents whose value is not listed sort
    /// after all listed ones.
    pub fn order_by_field<I, V>(&mut self, field: &str, ids: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let ids = ids.into_iter().map(Into::into).collect::<Vec<Value>>();
        let mut params = Map::new();
        params.insert("ids".to_string(), Value::Array(ids));
        self.sort.push(SortClause::Script {
            source: position_script(field),
            params,
            order: SortOrder::Asc,
        });
        self
    }

    /// Number of hits [`Builder::get`] returns
    pub fn take(&mut self, n: usize) -> &mut Self {
        self.take = n;
        self
    }

    // ========================================================================
    // Conditional composition
    // ========================================================================

    pub fn when<F>(&mut self, condition: bool, f: F) -> &mut Self
    where
        F: FnOnce(&mut Self),
    {
        if condition {
            f(self);
        }
        self
    }

    pub fn when_else<F, G>(&mut self, condition: bool, f: F, otherwise: G) -> &mut Self
    where
        F: FnOnce(&mut Self),
        G: FnOnce(&mut Self),
    {
        if condition {
            f(self);
        } else {
            otherwise(self);
        }
        self
    }

    // ========================================================================
    // Aggregations
    // ========================================================================

    /// Terms aggregation on `field`, registered under `name`
    pub fn group_by(&mut self, field: &str, name: &str, size: Option<usize>) -> &mut Self {
        let agg = match size {
            Some(size) => Aggregation::terms_with_size(field, size),
            None => Aggregation::terms(field),
        };
        self.aggs
            .insert(name.to_string(), agg.to_value());
        self
    }

    /// Register an arbitrary aggregation; an existing name is replaced in place
    pub fn add_aggs(&mut self, name: &str, spec: Value) -> &mut Self {
        self.aggs
            .insert(name.to_string(), Aggregation::Raw(spec).to_value());
        self
    }

    // ========================================================================
    // Inspection
    // ========================================================================

    /// Compiled `{query, highlight?, sort?}` document
    pub fn payload(&self) -> Value {
        let mut payload = Map::new();
        payload.insert("query".to_string(), self.query.compile());
        if !self.highlight.is_empty() {
            payload.insert("highlight".to_string(), json!(self.highlight));
        }
        if !self.sort.is_empty() {
            payload.insert("sort".to_string(), json!(self.sort));
        }
        Value::Object(payload)
    }

    pub fn to_search_request(
        &self,
        from: usize,
        size: usize,
        track_total_hits: Option<TrackTotalHits>,
    ) -> SearchRequest {
        SearchRequest {
            index: self.model.index().to_string(),
            from,
            size,
            track_total_hits,
            body: SearchBody {
                query: self.query.compile(),
                sort: self.sort.clone(),
                highlight: (!self.highlight.is_empty()).then(|| self.highlight.clone()),
                source: self.source.clone(),
                aggs: self.aggs.clone(),
            },
        }
    }

    // ========================================================================
    // Terminal reads
    // ========================================================================

    /// First `take` matching records
    pub async fn get(&self) -> Result<Vec<Model>> {
        let response = self
            .search(0, self.take, Some(TrackTotalHits::Bool(true)))
            .await?;
        self.materialize(response.hits.hits, false)
    }

    pub async fn first(&self) -> Result<Option<Model>> {
        let response = self.search(0, 1, Some(TrackTotalHits::Bool(true))).await?;
        Ok(self.materialize(response.hits.hits, false)?.into_iter().next())
    }

    /// Page with an exact total; page numbers start at 1
    pub async fn page(&self, size: usize, page_number: usize) -> Result<Paginator<Model>> {
        let page_number = page_number.max(1);
        let from = page_offset(size, page_number)?;
        let response = self
            .search(from, size, Some(TrackTotalHits::Bool(true)))
            .await?;
        let total = response.total();
        let items = self.materialize(response.hits.hits, true)?;
        Ok(Paginator::counted(items, size, page_number, total))
    }

    /// Page without a total; fetches one extra hit to learn whether more exist
    pub async fn simple_page(&self, size: usize, page_number: usize) -> Result<Paginator<Model>> {
        let page_number = page_number.max(1);
        let from = page_offset(size, page_number)?;
        let fetch = size
            .checked_add(1)
            .ok_or_else(|| Error::InvalidPredicate(format!("page size {} is too large", size)))?;
        let response = self.search(from, fetch, None).await?;
        let items = self.materialize(response.hits.hits, true)?;
        Ok(Paginator::uncounted(items, size, page_number))
    }

    /// Aggregation results, optionally restricted to `names`
    pub async fn get_aggregations(&self, names: Option<&[&str]>) -> Result<Map<String, Value>> {
        let response = self.search(0, 0, Some(TrackTotalHits::Bool(true))).await?;
        let aggregations = match names {
            None => response.aggregations,
            Some(names) => response
                .aggregations
                .into_iter()
                .filter(|(name, _)| names.contains(&name.as_str()))
                .collect(),
        };
        Ok(aggregations)
    }

    // ========================================================================
    // Dispatch helpers
    // ========================================================================

    async fn search(
        &self,
        from: usize,
        size: usize,
        track_total_hits: Option<TrackTotalHits>,
    ) -> Result<SearchResponse> {
        let request = self.to_search_request(from, size, track_total_hits);
        let raw = self
            .dispatch(Method::Search, serde_json::to_value(&request)?)
            .await?;
        SearchResponse::from_value(raw)
    }

    pub(crate) async fn dispatch(&self, method: Method, params: Value) -> Result<Value> {
        debug!(
            method = %method,
            index = %self.model.index(),
            request = %params,
            "Dispatching engine request"
        );
        self.model.transport().send(method, params).await
    }

    /// Fresh record of the bound model
    pub(crate) fn record(&self, attributes: Map<String, Value>, original: Value) -> Model {
        let mut record = self.model.new_instance();
        record.set_attributes(attributes);
        record.set_original(original);
        record
    }

    fn materialize(&self, hits: Vec<Value>, with_score: bool) -> Result<Vec<Model>> {
        hits.into_iter()
            .map(|raw| {
                let hit = Hit::from_raw(&raw)?;
                let mut attributes = hit.source();
                if with_score {
                    attributes.insert(HIT_SCORE.to_string(), json!(hit.score));
                }
                Ok(self.record(attributes, raw))
            })
            .collect()
    }
}

/// Zero-based hit offset of a 1-based page
fn page_offset(size: usize, page_number: usize) -> Result<usize> {
    (page_number - 1).checked_mul(size).ok_or_else(|| {
        Error::InvalidPredicate(format!(
            "page {} of size {} is out of range",
            page_number, size
        ))
    })
}

fn position_script(field: &str) -> String {
    format!(
        "int count = params.ids.size(); \
         int value = (int) doc['{}'].value; \
         int position = params.ids.indexOf(value); \
         return position > -1 ? position : count + 1;",
        field
    )
}

//! Data transfer objects for the HTTP API.
//!
//! The prediction endpoint takes a routing suggestion document and hands it
//! back with each transit step annotated. Only the fields the service writes
//! are typed; everything else is carried through untouched in the `extra`
//! maps. A step's input fields stay raw JSON until the step is handled, so a
//! malformed leg fails on its own instead of rejecting the whole document.

use chrono_tz::Tz;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::{Coordinates, LineName, StepStop};
use crate::predict::{DepartureTime, LegOutcome, LegRequest, LegRequestError};
use crate::resolve::{Resolution, StopDescriptor, StopMatchMethod};

pub const RESPONSE_TITLE: &str = "Journeyti.me Prediction Response";
pub const RESPONSE_DESCRIPTION: &str = "Journeyti.me Step-by-Step Prediction Response";

/// A routing suggestion document: one or more alternative routes, each made
/// of steps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JourneyDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub routes: Vec<RouteSuggestion>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl JourneyDocument {
    /// Mark the document as a prediction response.
    pub fn set_response_banner(&mut self) {
        self.title = Some(RESPONSE_TITLE.to_string());
        self.description = Some(RESPONSE_DESCRIPTION.to_string());
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteSuggestion {
    #[serde(default)]
    pub steps: Vec<Step>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One step of a route. Steps without `transit_details` (walking, for
/// instance) are never annotated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Step {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transit_details: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prediction_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predicted_duration: Option<DurationValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_sequence: Option<StopSequence>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Step {
    /// The line a transit step rides, read ahead of its other fields.
    ///
    /// Returns `None` for non-transit steps.
    pub fn line(&self) -> Option<Result<LineName, LegRequestError>> {
        let details = self.transit_details.as_ref()?;
        Some(transit_line(details).and_then(|line| line.identifier()))
    }

    /// Build the leg request for a transit step.
    ///
    /// Fields are checked in order: line, planned duration, departure time,
    /// then the two stops. Returns `None` for non-transit steps.
    pub fn leg_request(&self, tz: Tz) -> Option<Result<LegRequest, LegRequestError>> {
        let details = self.transit_details.as_ref()?;
        Some(self.build_leg_request(details, tz))
    }

    fn build_leg_request(&self, details: &Value, tz: Tz) -> Result<LegRequest, LegRequestError> {
        let line = transit_line(details)?;
        let line_name = line.identifier()?;

        let planned = match &self.duration {
            Some(duration) => parse::<DurationValue>(duration, "duration")?.value,
            None => None,
        };
        let planned = planned.ok_or(LegRequestError::MissingDuration)?;
        let planned = LegRequest::validate_duration(planned)?;

        let departure_time = field::<TimeValue>(details, "departure_time")?
            .and_then(|t| t.value)
            .ok_or(LegRequestError::MissingDepartureTime)?
            .to_local(tz)?;

        let departure = TransitStop::descriptor(
            field(details, "departure_stop")?,
            "departure",
        )?;
        let arrival = TransitStop::descriptor(field(details, "arrival_stop")?, "arrival")?;

        Ok(LegRequest {
            line: line_name,
            long_name: line.name,
            headsign: field(details, "headsign")?,
            planned_duration_s: planned,
            departure_time,
            departure,
            arrival,
        })
    }

    /// Write a leg outcome into the step.
    pub fn annotate(&mut self, outcome: &LegOutcome) {
        self.prediction_status = Some(outcome.status());
        self.predicted_duration = outcome
            .predicted_duration()
            .map(|(text, value)| DurationValue {
                text: Some(text),
                value: Some(value),
                extra: Map::new(),
            });
        self.stop_sequence = outcome
            .prediction()
            .filter(|p| !p.step_stops.is_empty())
            .map(|p| StopSequence::from_step_stops(&p.step_stops));
    }
}

/// A `{text, value}` duration; value in seconds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DurationValue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn transit_line(details: &Value) -> Result<TransitLine, LegRequestError> {
    if !details.is_object() {
        return Err(LegRequestError::InvalidField {
            field: "transit_details",
            reason: "expected an object".to_string(),
        });
    }
    field(details, "line")?.ok_or(LegRequestError::MissingLine)
}

/// Read a JSON value as `T`, naming it in the error.
fn parse<T: DeserializeOwned>(value: &Value, name: &'static str) -> Result<T, LegRequestError> {
    T::deserialize(value).map_err(|e| LegRequestError::InvalidField {
        field: name,
        reason: e.to_string(),
    })
}

/// Read one field of a JSON object. Missing and null fields are `None`.
fn field<T: DeserializeOwned>(
    object: &Value,
    key: &'static str,
) -> Result<Option<T>, LegRequestError> {
    match object.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => parse(value, key).map(Some),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransitLine {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TransitLine {
    /// The line identifier: the short name when present, else the name.
    pub fn identifier(&self) -> Result<LineName, LegRequestError> {
        let chosen = self
            .short_name
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .or(self.name.as_deref())
            .ok_or(LegRequestError::MissingLine)?;
        Ok(LineName::parse(chosen)?)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeValue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<DepartureTime>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransitStop {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<LatLng>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TransitStop {
    fn descriptor(
        stop: Option<TransitStop>,
        which: &'static str,
    ) -> Result<StopDescriptor, LegRequestError> {
        let stop = stop.ok_or(LegRequestError::MissingStop(which))?;
        let location = stop.location.ok_or(LegRequestError::MissingStop(which))?;
        let position = Coordinates::new(location.lat, location.lng)
            .map_err(|source| LegRequestError::InvalidStopLocation { which, source })?;
        Ok(StopDescriptor::new(stop.name.unwrap_or_default(), position))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl From<&Coordinates> for LatLng {
    fn from(c: &Coordinates) -> Self {
        Self {
            lat: c.lat(),
            lng: c.lon(),
        }
    }
}

/// The stops a leg passes through, with per-stop predictions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StopSequence {
    pub stops: Vec<StopSequenceEntry>,
}

impl StopSequence {
    pub fn from_step_stops(step_stops: &[StepStop]) -> Self {
        Self {
            stops: step_stops.iter().map(StopSequenceEntry::from_step_stop).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StopSequenceEntry {
    pub stop_id: String,
    pub name: String,
    pub location: LatLng,
    pub sequence_no: u32,
    pub shape_dist_traveled: f64,
    pub dist_from_first_stop_m: f64,
    pub predicted_time_from_first_stop_s: f64,
}

impl StopSequenceEntry {
    pub fn from_step_stop(step: &StepStop) -> Self {
        Self {
            stop_id: step.stop.id.as_str().to_string(),
            name: step.stop.name.clone(),
            location: LatLng::from(&step.stop.position),
            sequence_no: step.sequence,
            shape_dist_traveled: step.shape_dist_traveled,
            dist_from_first_stop_m: step.dist_from_first_stop_m,
            predicted_time_from_first_stop_s: step.predicted_time_from_first_stop_s,
        }
    }
}

/// Query for the stop sequence diagnostic endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct StopsByLineQuery {
    pub line: String,
    /// Route long name, used to pick a direction when no headsign is given.
    pub name: Option<String>,
    pub headsign: Option<String>,
    /// Epoch seconds (fractions allowed) or `YYYY-MM-DDTHH:MM:SS[.suffix]`.
    pub departure: String,
    pub dep_lat: f64,
    pub dep_lon: f64,
    #[serde(default)]
    pub dep_name: String,
    pub arr_lat: f64,
    pub arr_lon: f64,
    #[serde(default)]
    pub arr_name: String,
}

impl StopsByLineQuery {
    pub fn leg_request(&self, tz: Tz) -> Result<LegRequest, LegRequestError> {
        let departure_time = match self.departure.trim().parse::<f64>() {
            Ok(secs) => DepartureTime::Epoch(secs),
            Err(_) => DepartureTime::Text(self.departure.clone()),
        }
        .to_local(tz)?;

        let departure = Coordinates::new(self.dep_lat, self.dep_lon).map_err(|source| {
            LegRequestError::InvalidStopLocation {
                which: "departure",
                source,
            }
        })?;
        let arrival = Coordinates::new(self.arr_lat, self.arr_lon).map_err(|source| {
            LegRequestError::InvalidStopLocation {
                which: "arrival",
                source,
            }
        })?;

        Ok(LegRequest {
            line: LineName::parse(&self.line)?,
            long_name: self.name.clone().filter(|n| !n.trim().is_empty()),
            headsign: self.headsign.clone().filter(|h| !h.trim().is_empty()),
            planned_duration_s: 0.0,
            departure_time,
            departure: StopDescriptor::new(self.dep_name.clone(), departure),
            arrival: StopDescriptor::new(self.arr_name.clone(), arrival),
        })
    }
}

/// Resolved stop sequence for one leg, without prediction.
#[derive(Debug, Clone, Serialize)]
pub struct StopsByLineResponse {
    pub line: String,
    pub route_confidence: &'static str,
    pub departure_stop: MatchedStop,
    pub arrival_stop: MatchedStop,
    pub trip_id: Option<String>,
    pub stops: Vec<StopSequenceEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchedStop {
    pub stop_id: String,
    pub matched_by: &'static str,
}

impl StopsByLineResponse {
    pub fn from_resolution(line: &LineName, resolution: &Resolution) -> Self {
        Self {
            line: line.as_str().to_string(),
            route_confidence: resolution.route_confidence.description(),
            departure_stop: MatchedStop {
                stop_id: resolution.departure_stop.as_str().to_string(),
                matched_by: method_label(resolution.departure_method),
            },
            arrival_stop: MatchedStop {
                stop_id: resolution.arrival_stop.as_str().to_string(),
                matched_by: method_label(resolution.arrival_method),
            },
            trip_id: resolution.trip.as_ref().map(|t| t.as_str().to_string()),
            stops: resolution
                .stops
                .iter()
                .map(StopSequenceEntry::from_step_stop)
                .collect(),
        }
    }
}

fn method_label(method: StopMatchMethod) -> &'static str {
    match method {
        StopMatchMethod::Name => "name",
        StopMatchMethod::Proximity => "proximity",
    }
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

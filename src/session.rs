//! The editing session: one source image, one mask, and the flags that
//! decide what the compositor shows.
//!
//! ```text
//! Empty -> Loaded -> Processing -> Cutout | Error
//!                    Cutout <-> Editing
//! ```
//!
//! A new upload always returns the session to `Loaded`. An attempt that
//! is still in flight for the previous upload keeps the session busy until
//! it finishes or is abandoned; its result is then discarded.

use crate::compositor::{self, CompositeFlags};
use crate::error::{Result, SessionError};
use crate::input::{SourceImage, Upload};
use crate::mask::{BrushMode, BrushStroke, MaskBuffer};
use crate::segmentation::{
    ColdStartWarning, MaskInterpreter, MaskKind, PromptPoint, SegmentationBackend,
    SegmentationClient, SegmentationRequest,
};
use crate::view::Viewport;
use image::{GrayImage, Luma, RgbaImage};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Empty,
    Loaded,
    Processing,
    Cutout,
    Editing,
    Error,
}

/// Identifies the upload a segmentation request was made for.
/// Results for an older upload are discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentationTicket {
    generation: u64,
    attempt: u64,
}

/// The attempt currently out with the backend
#[derive(Debug, Clone, Copy)]
struct InFlight {
    ticket: SegmentationTicket,
    /// State to return to if the attempt is abandoned
    prior: SessionState,
}

pub struct EditingSession {
    source: Option<SourceImage>,
    mask: MaskBuffer,
    cutout: bool,
    compare: bool,
    state: SessionState,
    points: Vec<PromptPoint>,
    interpreter: MaskInterpreter,
    generation: u64,
    attempts: u64,
    in_flight: Option<InFlight>,
    last_error: Option<String>,
    last_kind: Option<MaskKind>,
}

impl Default for EditingSession {
    fn default() -> Self {
        Self::new(MaskInterpreter::default())
    }
}

impl EditingSession {
    pub fn new(interpreter: MaskInterpreter) -> Self {
        Self {
            source: None,
            mask: MaskBuffer::blank(0, 0),
            cutout: false,
            compare: false,
            state: SessionState::Empty,
            points: Vec::new(),
            interpreter,
            generation: 0,
            attempts: 0,
            in_flight: None,
            last_error: None,
            last_kind: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_cutout(&self) -> bool {
        self.cutout
    }

    pub fn is_comparing(&self) -> bool {
        self.compare
    }

    pub fn source(&self) -> Option<&SourceImage> {
        self.source.as_ref()
    }

    pub fn mask(&self) -> &MaskBuffer {
        &self.mask
    }

    pub fn points(&self) -> &[PromptPoint] {
        &self.points
    }

    /// Message of the most recent failed attempt, cleared by the next attempt
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// True while a segmentation attempt is out, even one for a replaced upload
    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    /// How the most recent remote result was interpreted
    pub fn last_kind(&self) -> Option<MaskKind> {
        self.last_kind
    }

    /// Decode `upload` and start over with a blank mask.
    ///
    /// On failure the current image, mask and flags are kept.
    pub fn load(&mut self, upload: Upload) -> Result<()> {
        let source = match SourceImage::decode(upload) {
            Ok(source) => source,
            Err(e) => {
                self.last_error = Some(e.to_string());
                return Err(e);
            }
        };

        let (width, height) = source.dimensions();
        tracing::info!(
            "Loaded {} ({}x{})",
            source.upload().file_name,
            width,
            height
        );

        // the previous image and its encoded bytes are dropped here
        self.source = Some(source);
        self.mask = MaskBuffer::blank(width, height);
        self.cutout = false;
        self.compare = false;
        self.points.clear();
        self.generation += 1;
        self.last_error = None;
        self.last_kind = None;
        self.state = SessionState::Loaded;
        Ok(())
    }

    pub fn set_compare(&mut self, compare: bool) {
        self.compare = compare;
    }

    pub fn add_point(&mut self, point: PromptPoint) {
        self.points.push(point);
    }

    pub fn clear_points(&mut self) {
        self.points.clear();
    }

    /// Build the request for one segmentation attempt and mark the session busy.
    /// At most one attempt may be in flight.
    pub fn begin_segmentation(&mut self) -> Result<(SegmentationTicket, SegmentationRequest)> {
        let source = self.source.as_ref().ok_or(SessionError::NoImage)?;
        if self.in_flight.is_some() {
            return Err(SessionError::Busy);
        }

        let request = SegmentationRequest::new(source.upload().clone(), self.points.clone());
        self.attempts += 1;
        let ticket = SegmentationTicket {
            generation: self.generation,
            attempt: self.attempts,
        };
        self.in_flight = Some(InFlight {
            ticket,
            prior: self.state,
        });
        self.state = SessionState::Processing;
        self.last_error = None;

        Ok((ticket, request))
    }

    /// Apply the outcome of an attempt started with [`Self::begin_segmentation`].
    ///
    /// Returns `Ok(None)` when the ticket belongs to an earlier upload or to an
    /// abandoned attempt; the result is dropped. Any error leaves the mask and
    /// cutout flag as they were.
    pub fn finish_segmentation(
        &mut self,
        ticket: SegmentationTicket,
        result: Result<RgbaImage>,
    ) -> Result<Option<MaskKind>> {
        if self.take_in_flight(ticket).is_none() || ticket.generation != self.generation {
            tracing::debug!("Discarding stale segmentation result");
            return Ok(None);
        }

        let applied = result.and_then(|image| self.interpreter.apply(&image, &mut self.mask));

        match applied {
            Ok(kind) => {
                self.cutout = true;
                self.last_kind = Some(kind);
                self.state = SessionState::Cutout;
                tracing::info!("Segmentation applied ({:?})", kind);
                Ok(Some(kind))
            }
            Err(e) => {
                tracing::error!("Segmentation failed: {}", e);
                self.last_error = Some(e.to_string());
                self.state = SessionState::Error;
                Err(e)
            }
        }
    }

    /// Give up on an attempt that will never be finished. The session goes
    /// back to the state it was in before [`Self::begin_segmentation`].
    pub fn abandon_segmentation(&mut self, ticket: SegmentationTicket) {
        let Some(in_flight) = self.take_in_flight(ticket) else {
            return;
        };
        if self.state == SessionState::Processing {
            self.state = in_flight.prior;
        }
        tracing::debug!("Segmentation attempt abandoned");
    }

    fn take_in_flight(&mut self, ticket: SegmentationTicket) -> Option<InFlight> {
        match self.in_flight {
            Some(in_flight) if in_flight.ticket == ticket => {
                self.in_flight = None;
                Some(in_flight)
            }
            _ => None,
        }
    }

    /// Run one attempt end to end against `client`.
    ///
    /// Dropping the returned future before it completes abandons the attempt.
    pub async fn segment<B, F>(&mut self, client: &SegmentationClient<B>, on_cold_start: F) -> Result<MaskKind>
    where
        B: SegmentationBackend,
        F: FnMut(ColdStartWarning),
    {
        let (ticket, request) = self.begin_segmentation()?;
        let attempt = PendingAttempt {
            session: self,
            ticket: Some(ticket),
        };
        let result = client.segment(&request, on_cold_start).await;
        // the ticket is always current here: the session was borrowed throughout
        attempt
            .finish(result)?
            .ok_or_else(|| SessionError::backend("segmentation result was discarded"))
    }

    /// Pointer down: subsequent dabs belong to one manual edit
    pub fn begin_stroke(&mut self) -> Result<()> {
        self.source.as_ref().ok_or(SessionError::NoImage)?;
        if self.state != SessionState::Processing {
            self.state = SessionState::Editing;
        }
        Ok(())
    }

    /// Apply one dab immediately. Before any cutout exists the whole image
    /// counts as kept, so the first dab starts from a fully opaque mask.
    pub fn stroke(&mut self, stroke: BrushStroke) -> Result<()> {
        self.source.as_ref().ok_or(SessionError::NoImage)?;

        if !self.cutout {
            let (width, height) = self.mask.dimensions();
            self.mask = MaskBuffer::from_alpha(GrayImage::from_pixel(width, height, Luma([255])));
        }
        stroke.apply(&mut self.mask);
        self.cutout = true;

        match self.state {
            SessionState::Processing | SessionState::Editing => {}
            _ => self.state = SessionState::Cutout,
        }
        Ok(())
    }

    /// Apply a dab given in screen coordinates; the radius is scaled with the view
    pub fn stroke_at_screen(
        &mut self,
        view: &Viewport,
        sx: f32,
        sy: f32,
        screen_radius: f32,
        mode: BrushMode,
    ) -> Result<()> {
        let (x, y) = view.screen_to_image(sx, sy);
        self.stroke(BrushStroke::new(x, y, screen_radius * view.scale(), mode))
    }

    /// Pointer up
    pub fn end_stroke(&mut self) {
        if self.state == SessionState::Editing {
            self.state = SessionState::Cutout;
        }
    }

    /// Blur the edge of the current cutout. No-op without one.
    pub fn feather(&mut self, sigma: f32) -> Result<()> {
        self.source.as_ref().ok_or(SessionError::NoImage)?;
        if self.cutout {
            self.mask.feather(sigma);
        }
        Ok(())
    }

    /// Current visible frame
    pub fn render(&self) -> Result<RgbaImage> {
        let source = self.source.as_ref().ok_or(SessionError::NoImage)?;
        let flags = CompositeFlags {
            cutout: self.cutout,
            compare: self.compare,
        };
        Ok(compositor::composite(source.pixels(), &self.mask, flags))
    }

    /// Current frame as PNG bytes
    pub fn export_png(&self) -> Result<Vec<u8>> {
        compositor::encode_png(&self.render()?)
    }
}

/// Abandons its attempt when dropped before [`PendingAttempt::finish`]
struct PendingAttempt<'a> {
    session: &'a mut EditingSession,
    ticket: Option<SegmentationTicket>,
}

impl PendingAttempt<'_> {
    fn finish(mut self, result: Result<RgbaImage>) -> Result<Option<MaskKind>> {
        match self.ticket.take() {
            Some(ticket) => self.session.finish_segmentation(ticket, result),
            None => Ok(None),
        }
    }
}

impl Drop for PendingAttempt<'_> {
    fn drop(&mut self) {
        if let Some(ticket) = self.ticket.take() {
            self.session.abandon_segmentation(ticket);
        }
    }
}

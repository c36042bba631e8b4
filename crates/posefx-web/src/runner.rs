use posefx::{
    build_render_buffer, pack_frame, AssetError, AssetManifest, CompletionCallback, ConfigError,
    DispatchOutcome, EffectEvent, EngineConfig, EngineContext, Orchestrator, PoseLabel,
    PoseSnapshot, ProtocolLayout, RenderBuffer, VectorAsset,
};

/// Owns the engine for one page and wires the frame loop.
///
/// Holds no wasm types so it can be driven from native tests; `lib.rs`
/// wraps it in a `thread_local!` and exports free functions.
pub struct EffectsRunner {
    config: EngineConfig,
    ctx: EngineContext,
    orchestrator: Orchestrator,
    render_buffer: RenderBuffer,
    layout: ProtocolLayout,
    frame: Vec<f32>,
    frame_counter: u64,
    /// Events drained during the last tick.
    events: Vec<EffectEvent>,
}

impl EffectsRunner {
    /// Build from a (possibly partial, possibly empty) JSON config.
    pub fn new(config_json: &str) -> Result<Self, ConfigError> {
        let config = if config_json.trim().is_empty() {
            EngineConfig::default()
        } else {
            EngineConfig::from_json(config_json)?
        };
        let orchestrator = Orchestrator::new(&config)?;
        let layout = ProtocolLayout::from_config(&config);
        Ok(Self {
            ctx: EngineContext::new(&config),
            orchestrator,
            render_buffer: RenderBuffer::with_capacity(config.max_instances),
            frame: Vec::with_capacity(layout.buffer_total_floats),
            layout,
            config,
            frame_counter: 0,
            events: Vec::new(),
        })
    }

    pub fn load_manifest(&mut self, json: &str) -> Result<usize, AssetError> {
        let manifest = AssetManifest::from_json(json)?;
        self.ctx.textures.extend(&manifest);
        Ok(manifest.textures.len())
    }

    pub fn texture_loaded(&mut self, name: &str, ok: bool) -> bool {
        self.ctx.textures.mark_loaded(name, ok)
    }

    pub fn vector_asset_loaded(&mut self, json: &str) {
        let asset = VectorAsset::from_json(json);
        self.orchestrator.vector_asset_loaded(&mut self.ctx, asset);
    }

    pub fn vector_asset_failed(&mut self, reason: &str) {
        self.orchestrator
            .vector_asset_loaded(&mut self.ctx, Err(AssetError::LoadFailed(reason.to_string())));
    }

    /// Dispatch a classifier label. `landmarks` is flat `[x, y, z, visibility]*`;
    /// hand landmarks carry no score and should be sent with visibility 1.
    /// A malformed buffer is logged and treated as "no snapshot".
    pub fn show_effect(
        &mut self,
        label: i32,
        landmarks: &[f32],
        on_complete: Option<CompletionCallback>,
    ) -> DispatchOutcome {
        let pose = parse_pose(landmarks);
        self.orchestrator.show_effect(
            &mut self.ctx,
            PoseLabel::from_index(label),
            pose.as_ref(),
            on_complete,
        )
    }

    /// Feed a raw classification through the consecutive-detection gate.
    pub fn observe_label(
        &mut self,
        label: i32,
        landmarks: &[f32],
        on_complete: Option<CompletionCallback>,
    ) -> DispatchOutcome {
        let pose = parse_pose(landmarks);
        self.orchestrator.observe_label(
            &mut self.ctx,
            PoseLabel::from_index(label),
            pose.as_ref(),
            on_complete,
        )
    }

    pub fn update_landmarks(&mut self, landmarks: &[f32]) {
        if let Some(pose) = parse_pose(landmarks) {
            self.orchestrator.update_landmarks(&pose);
        }
    }

    pub fn is_effect_in_progress(&self) -> bool {
        self.orchestrator.is_effect_in_progress()
    }

    /// Run one display frame and repack the shared buffer.
    pub fn tick(&mut self, now_ms: f64) {
        self.orchestrator.animate(&mut self.ctx, now_ms);
        self.events = self.orchestrator.drain_events();

        build_render_buffer(&self.ctx.scene, &mut self.render_buffer);

        self.frame_counter += 1;
        pack_frame(
            &self.layout,
            self.frame_counter,
            (self.config.surface_width, self.config.surface_height),
            &self.render_buffer,
            &self.events,
            &mut self.frame,
        );
    }

    pub fn stop_all(&mut self) {
        self.orchestrator.stop_all(&mut self.ctx);
    }

    // ---- Commentary ----

    pub fn commentary_text(&self) -> String {
        self.ctx.commentary.message().to_string()
    }

    pub fn commentary_generation(&self) -> u64 {
        self.ctx.commentary.generation()
    }

    pub fn commentary_animation_end(&mut self) {
        self.ctx.commentary.animation_end();
    }

    // ---- Buffer accessors ----

    pub fn frame_ptr(&self) -> *const f32 {
        self.frame.as_ptr()
    }

    pub fn frame_len(&self) -> u32 {
        self.frame.len() as u32
    }

    pub fn instance_count(&self) -> u32 {
        self.render_buffer.instance_count()
    }

    pub fn vector_vertex_count(&self) -> u32 {
        self.render_buffer.vector_vertex_count()
    }

    pub fn events(&self) -> &[EffectEvent] {
        &self.events
    }

    pub fn layout(&self) -> &ProtocolLayout {
        &self.layout
    }

    pub fn context(&self) -> &EngineContext {
        &self.ctx
    }
}

fn parse_pose(landmarks: &[f32]) -> Option<PoseSnapshot> {
    if landmarks.is_empty() {
        return None;
    }
    match PoseSnapshot::from_flat(landmarks) {
        Ok(pose) => Some(pose),
        Err(e) => {
            log::error!("bad landmark buffer: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use posefx::EffectKind;
    use std::cell::Cell;
    use std::rc::Rc;

    fn flat_pose() -> Vec<f32> {
        [0.5, 0.5, 0.0, 1.0].repeat(33)
    }

    #[test]
    fn empty_config_uses_defaults() {
        let runner = EffectsRunner::new("").unwrap();
        assert_eq!(runner.layout(), &ProtocolLayout::from_config(&EngineConfig::default()));
        assert!(!runner.is_effect_in_progress());
    }

    #[test]
    fn bad_config_is_error() {
        assert!(EffectsRunner::new("{ nope").is_err());
    }

    #[test]
    fn teleport_round_trip_through_frame_buffer() {
        let mut runner = EffectsRunner::new("{}").unwrap();
        let fired = Rc::new(Cell::new(0));
        let sink = Rc::clone(&fired);
        let outcome = runner.show_effect(
            PoseLabel::Teleport.index() as i32,
            &[],
            Some(Box::new(move |_| sink.set(sink.get() + 1))),
        );
        assert!(matches!(outcome, DispatchOutcome::Dispatched { .. }));
        assert_eq!(runner.commentary_text(), "Instant Transmission!!!");

        let mut now = 0.0;
        while now <= 2_000.0 {
            runner.tick(now);
            if !runner.events().is_empty() {
                assert_eq!(runner.events(), &[EffectEvent::Completed(EffectKind::Teleport)]);
            }
            now += 16.0;
        }
        assert_eq!(fired.get(), 1);
        assert_eq!(runner.frame_len() as usize, runner.layout().buffer_total_floats);
        assert_eq!(runner.instance_count(), 1);
    }

    #[test]
    fn misaligned_landmarks_are_ignored() {
        let mut runner = EffectsRunner::new("").unwrap();
        let outcome = runner.show_effect(PoseLabel::ChargedSphere.index() as i32, &[0.5, 0.5, 0.0], None);
        assert!(matches!(outcome, DispatchOutcome::Skipped(_)));
        let outcome = runner.show_effect(PoseLabel::ChargedSphere.index() as i32, &flat_pose(), None);
        assert!(matches!(outcome, DispatchOutcome::Dispatched { .. }));
    }

    #[test]
    fn negative_label_is_ignored() {
        let mut runner = EffectsRunner::new("").unwrap();
        assert_eq!(runner.show_effect(-1, &flat_pose(), None), DispatchOutcome::Ignored);
    }

    #[test]
    fn manifest_registers_textures() {
        let mut runner = EffectsRunner::new("").unwrap();
        let n = runner
            .load_manifest(r#"{ "textures": [{ "name": "room", "path": "room.png" }] }"#)
            .unwrap();
        assert_eq!(n, 1);
        assert!(runner.texture_loaded("room", true));
    }
}

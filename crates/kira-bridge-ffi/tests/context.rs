use kira_bridge::policy::engine_factory;
use kira_bridge::{Bridge, CancelToken, InferenceEngine};
use kira_bridge_ffi::{
    KiraBridge, kira_bridge_free, kira_bridge_initialize, kira_bridge_last_error, kira_bridge_last_response,
    kira_bridge_new, kira_bridge_run,
};
use std::ffi::{CStr, c_char};
use std::sync::{Arc, Mutex};
use std::thread;

fn read(ptr: *const c_char) -> String {
    assert!(!ptr.is_null());
    unsafe { CStr::from_ptr(ptr) }.to_str().unwrap().to_owned()
}

#[test]
fn fresh_context_reports_not_loaded() {
    let ctx = kira_bridge_new();
    unsafe {
        assert_eq!(read(kira_bridge_last_response(ctx)), "Model not loaded");
        assert_eq!(kira_bridge_run(ctx, c"hello".as_ptr()), -1);
        assert_eq!(read(kira_bridge_last_response(ctx)), "Model not loaded");
        assert!(!read(kira_bridge_last_error(ctx)).is_empty());
        kira_bridge_free(ctx);
    }
}

#[test]
fn contexts_are_isolated() {
    let wellness = kira_bridge_new();
    let standard = kira_bridge_new();
    unsafe {
        assert_eq!(
            kira_bridge_initialize(wellness, c"/data/models/gemma-wellness-f16.gguf".as_ptr()),
            0
        );
        assert_eq!(
            kira_bridge_initialize(standard, c"/data/models/other.bin".as_ptr()),
            0
        );

        let len = kira_bridge_run(wellness, c"I feel stressed".as_ptr());
        let text = read(kira_bridge_last_response(wellness));
        assert_eq!(len as usize, text.len());
        assert!(text.contains("stress"));

        // The other context has not produced anything yet.
        assert_eq!(
            read(kira_bridge_last_response(standard)),
            "Hello! I'm Kira, your wellness assistant."
        );
        kira_bridge_run(standard, c"I feel stressed".as_ptr());
        assert_eq!(
            read(kira_bridge_last_response(standard)),
            "Response from Llama model (placeholder)"
        );
        assert_eq!(read(kira_bridge_last_response(wellness)), text);

        kira_bridge_free(wellness);
        kira_bridge_free(standard);
    }
}

#[test]
fn null_context_is_rejected() {
    unsafe {
        assert_eq!(
            kira_bridge_initialize(std::ptr::null(), c"model.bin".as_ptr()),
            -2
        );
        assert_eq!(kira_bridge_run(std::ptr::null(), c"hello".as_ptr()), -2);
        assert!(kira_bridge_last_response(std::ptr::null()).is_null());
        kira_bridge_free(std::ptr::null_mut());
    }
}

struct Gated {
    started: crossbeam::channel::Sender<()>,
    release: crossbeam::channel::Receiver<()>,
}

impl InferenceEngine for Gated {
    fn generate(&mut self, _prompt: &str, _cancel: &CancelToken) -> anyhow::Result<String> {
        self.started.send(())?;
        self.release.recv()?;
        Ok("stale answer".to_string())
    }
}

struct Echo;

impl InferenceEngine for Echo {
    fn generate(&mut self, prompt: &str, _cancel: &CancelToken) -> anyhow::Result<String> {
        Ok(prompt.to_string())
    }
}

#[test]
fn run_interrupted_by_initialize_reports_cancelled() {
    let (started_tx, started_rx) = crossbeam::channel::bounded(1);
    let (release_tx, release_rx) = crossbeam::channel::bounded(1);
    let gate = Mutex::new(Some(Gated {
        started: started_tx,
        release: release_rx,
    }));
    let factory = engine_factory(move |_| {
        let engine: Box<dyn InferenceEngine> = match gate.lock().unwrap().take() {
            Some(gated) => Box::new(gated),
            None => Box::new(Echo),
        };
        Ok(engine)
    });
    let ctx = Arc::new(KiraBridge::from_bridge(
        Bridge::default().with_engine_factory(factory),
    ));

    assert_eq!(unsafe { ctx.initialize(c"/data/models/first.gguf".as_ptr()) }, 0);
    let worker = {
        let ctx = Arc::clone(&ctx);
        thread::spawn(move || unsafe { ctx.run(c"question".as_ptr()) })
    };
    started_rx.recv().unwrap();
    assert_eq!(unsafe { ctx.initialize(c"/data/models/second.gguf".as_ptr()) }, 0);
    release_tx.send(()).unwrap();

    assert_eq!(worker.join().unwrap(), -8);
    assert_eq!(
        read(ctx.last_response()),
        "Hello! I'm Kira, your wellness assistant."
    );

    let len = unsafe { ctx.run(c"question".as_ptr()) };
    let text = read(ctx.last_response());
    assert_eq!(text, "question");
    assert_eq!(len as usize, text.len());
}

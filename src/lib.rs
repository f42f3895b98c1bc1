// Metronome Engine - Rust Audio Core
// Real-time sample mixing with a thread-timed beat scheduler

// Module declarations
pub mod audio;
pub mod config;
pub mod decode;
pub mod engine;
pub mod error;
pub mod measure;

// Re-exports for convenience
pub use audio::{AudioFormat, Mixer, Player, PlayerHandle, Renderable, SampleBuffer};
pub use config::AppConfig;
pub use decode::{AssetDecoder, SynthAssetDecoder, WavAssetDecoder};
pub use engine::{BeatKind, BeatPattern, Metronome, MetronomeEvent, MetronomeEventKind, Tempo};
pub use error::{AudioError, DecodeError, ErrorCode};
pub use measure::Measure;

use tracing_subscriber::prelude::*;

/// Install the global tracing subscriber. Repeated calls are ignored.
#[cfg(target_os = "android")]
pub fn init_logging() {
    match tracing_android::layer("MetronomeEngine") {
        Ok(layer) => {
            let _ = tracing_subscriber::registry().with(layer).try_init();
        }
        Err(err) => eprintln!("Failed to create Android log layer: {}", err),
    }
}

/// Install the global tracing subscriber. Repeated calls are ignored.
#[cfg(not(target_os = "android"))]
pub fn init_logging() {
    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

/// JNI_OnLoad is called when the native library is loaded by Android
/// This function initializes the Android context required by oboe-rs
#[cfg(target_os = "android")]
#[no_mangle]
pub extern "system" fn JNI_OnLoad(vm: jni::JavaVM, _reserved: *mut std::ffi::c_void) -> jni::sys::jint {
    init_logging();
    log::info!("JNI_OnLoad called - initializing Android context");

    // SAFETY: the JavaVM pointer is valid for the lifetime of the process and
    // this runs before any Oboe stream is opened.
    unsafe {
        ndk_context::initialize_android_context(
            vm.get_java_vm_pointer().cast(),
            std::ptr::null_mut(),
        );
    }
    engine::backend::mark_context_initialized();

    log::info!("Android context initialized successfully");
    jni::sys::JNI_VERSION_1_6
}

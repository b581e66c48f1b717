//! JNI export for `com.kira.app.NodeBridge.startNode(String[])`.

use crate::launcher::EmbeddedRuntime;
use crate::node::NodeEntry;
use jni::JNIEnv;
use jni::objects::{JObject, JObjectArray, JString};
use jni::sys::jint;
use once_cell::sync::Lazy;

const LAUNCH_FAILED: jint = -1;

static NODE: Lazy<EmbeddedRuntime<NodeEntry>> = Lazy::new(|| EmbeddedRuntime::new(NodeEntry));

/// Blocks the calling Java thread until the embedded runtime exits and returns its exit
/// code, or `-1` when the arguments cannot be read or the runtime was already started.
#[unsafe(no_mangle)]
pub extern "system" fn Java_com_kira_app_NodeBridge_startNode<'local>(
    mut env: JNIEnv<'local>,
    _this: JObject<'local>,
    args: JObjectArray<'local>,
) -> jint {
    let args = match java_string_array(&mut env, &args) {
        Ok(args) => args,
        Err(e) => {
            log::error!("[launcher] Failed to read startNode arguments: {e}");
            return LAUNCH_FAILED;
        }
    };

    match NODE.run(args) {
        Ok(code) => code,
        Err(e) => {
            log::error!("[launcher] startNode failed: {e}");
            LAUNCH_FAILED
        }
    }
}

fn java_string_array(
    env: &mut JNIEnv<'_>,
    array: &JObjectArray<'_>,
) -> jni::errors::Result<Vec<String>> {
    let len = env.get_array_length(array)?;
    let mut args = Vec::with_capacity(usize::try_from(len).unwrap_or_default());
    for i in 0..len {
        let element = JString::from(env.get_object_array_element(array, i)?);
        let value: String = env.get_string(&element)?.into();
        env.delete_local_ref(element)?;
        args.push(value);
    }
    Ok(args)
}

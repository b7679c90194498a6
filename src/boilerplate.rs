//! Fixed boilerplate consumed verbatim by the codegen.
//!
//! The offline-cache registration is an opaque template: the compiler never
//! inspects it, it only splices it into the generated document.

/// Opening of every generated document, up to the title.
pub const DOC_OPEN: &str = "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n";

/// Base style rules shared by every document. Pages are stacked and exactly
/// one carries the `active` class.
pub const BASE_STYLES: &str = "* { box-sizing: border-box; margin: 0; }\nbody { font-family: system-ui, sans-serif; }\n.page { display: none; min-height: 100vh; position: relative; }\n.page.active { display: block; }\n";

/// Runtime context bootstrap, emitted right after `<body>` so that the
/// per-element scripts can register nodes and listeners against it. The
/// program-specific parts of the runtime (store initialization, trigger,
/// dispatchers) are emitted later in the global script.
pub const RUNTIME_PRELUDE: &str = r#"<script>
const app = {
  state: {},
  nodes: {},
  watchers: {},
  wait: function (ms) { return new Promise(function (resolve) { setTimeout(resolve, ms); }); },
  watch: function (name, fn) { (app.watchers[name] = app.watchers[name] || []).push(fn); },
  px: function (v) { return typeof v === "number" ? v + "px" : v; },
  node: function (name) {
    const el = app.nodes[name];
    if (!el) { console.warn("unknown element: " + name); }
    return el;
  },
  normalizeKey: function (key) { return key === " " ? "space" : key.toLowerCase(); },
  save: function (name) { localStorage.setItem("psl:" + name, JSON.stringify(app.state[name])); },
  load: function (name) {
    const raw = localStorage.getItem("psl:" + name);
    if (raw !== null) { app.state[name] = JSON.parse(raw); app.trigger(name); }
  },
  notify: function (message) {
    if ("Notification" in window && Notification.permission === "granted") {
      new Notification(message);
    } else {
      alert(message);
    }
  }
};
</script>
"#;

/// Offline caching registration. Opaque template; spliced in unchanged at
/// the end of the body.
pub const OFFLINE_CACHE: &str = r#"<script>
if ("serviceWorker" in navigator) {
  const swSource = "self.addEventListener('install',function(e){e.waitUntil(caches.open('psl-cache-v1').then(function(c){return c.addAll(['./'])}))});self.addEventListener('fetch',function(e){e.respondWith(caches.match(e.request).then(function(r){return r||fetch(e.request)}))});";
  const swUrl = URL.createObjectURL(new Blob([swSource], { type: "text/javascript" }));
  navigator.serviceWorker.register(swUrl).catch(function () {});
}
</script>
"#;

/// Disables dragging on images, and keeps doing so for images inserted
/// later (for-loop instantiation happens after load).
pub const IMAGE_GUARD: &str = r#"const disableImageDrag = function () {
  document.querySelectorAll("img").forEach(function (img) { img.draggable = false; });
};
disableImageDrag();
new MutationObserver(disableImageDrag).observe(document.body, { childList: true, subtree: true });
"#;

//! Multipart body negotiation.
//!
//! A [`MultipartStage`] is prepended to every route's handler chain. For
//! non-multipart requests it is a pass-through. For multipart requests it
//! buffers the body, picks a [`BodyHandler`], and stores the parsed
//! results in the request context before the route handler runs.
//!
//! Handler selection:
//!
//! * uploads disabled → the fields-only handler; file parts are drained
//!   and discarded, never held;
//! * uploads enabled with a resolver → the resolver picks a handler per
//!   request; resolving `None` falls back to fields-only;
//! * uploads enabled without a resolver → fields-only.

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use portico_config::UploadSettings;
use portico_core::{
    BoxFuture, FormFields, PorticoError, PorticoResult, Request, RequestContext, Response,
    UploadedFile, UploadedFiles,
};
use portico_pipeline::{Middleware, Next};
use std::sync::Arc;

/// Parses a buffered multipart body into context extensions.
///
/// Implementations decide which file parts to retain; text fields are
/// always parsed into [`FormFields`].
pub trait BodyHandler: Send + Sync {
    /// Handler name, for logs.
    fn name(&self) -> &'static str;

    /// Parses the body and stores the results in the context.
    fn parse<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        content_type: &'a str,
        body: Bytes,
    ) -> BoxFuture<'a, PorticoResult<()>>;
}

/// Picks a [`BodyHandler`] per request when uploads are enabled.
pub type UploadResolver =
    Arc<dyn Fn(&Request) -> Option<Arc<dyn BodyHandler>> + Send + Sync>;

fn multipart_error(err: multer::Error) -> PorticoError {
    PorticoError::multipart(err.to_string())
}

/// Walks every part of a multipart body. Text fields land in the
/// returned [`FormFields`]; each file part is offered to `on_file`, which
/// retains or drops it. Either way the part's bytes are consumed, so a
/// dropped file never stalls the parse.
async fn walk_parts<F>(
    content_type: &str,
    body: Bytes,
    mut on_file: F,
) -> PorticoResult<FormFields>
where
    F: FnMut(UploadedFile),
{
    let boundary = multer::parse_boundary(content_type).map_err(multipart_error)?;
    let stream = futures_util::stream::once(async move { Ok::<Bytes, std::io::Error>(body) });
    let mut multipart = multer::Multipart::new(stream, boundary);

    let mut fields = FormFields::new();
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let field_name = field.name().unwrap_or_default().to_string();
        if field.file_name().is_some() {
            let file_name = field.file_name().map(str::to_string);
            let content_type = field.content_type().map(ToString::to_string);
            let data = field.bytes().await.map_err(multipart_error)?;
            on_file(UploadedFile {
                field_name,
                file_name,
                content_type,
                data,
            });
        } else {
            let text = field.text().await.map_err(multipart_error)?;
            fields.insert(field_name, text);
        }
    }
    Ok(fields)
}

/// The default handler: text fields only. File parts are consumed and
/// discarded, and no [`UploadedFiles`] extension is stored.
pub struct FieldsOnly;

impl BodyHandler for FieldsOnly {
    fn name(&self) -> &'static str {
        "fields_only"
    }

    fn parse<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        content_type: &'a str,
        body: Bytes,
    ) -> BoxFuture<'a, PorticoResult<()>> {
        Box::pin(async move {
            let fields = walk_parts(content_type, body, |file| {
                tracing::debug!(field = %file.field_name, "file part discarded");
            })
            .await?;
            ctx.set_extension(fields);
            Ok(())
        })
    }
}

/// Retains at most one file, from the named form field. File parts under
/// any other field name are discarded.
pub struct SingleFile {
    field: String,
}

impl SingleFile {
    /// Creates a handler retaining the first file sent under `field`.
    #[must_use]
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }
}

impl BodyHandler for SingleFile {
    fn name(&self) -> &'static str {
        "single_file"
    }

    fn parse<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        content_type: &'a str,
        body: Bytes,
    ) -> BoxFuture<'a, PorticoResult<()>> {
        Box::pin(async move {
            let mut files = UploadedFiles::new();
            let fields = walk_parts(content_type, body, |file| {
                if files.is_empty() && file.field_name == self.field {
                    files.push(file);
                }
            })
            .await?;
            ctx.set_extension(fields);
            ctx.set_extension(files);
            Ok(())
        })
    }
}

/// Retains every file part, regardless of field name.
pub struct AnyFiles;

impl BodyHandler for AnyFiles {
    fn name(&self) -> &'static str {
        "any_files"
    }

    fn parse<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        content_type: &'a str,
        body: Bytes,
    ) -> BoxFuture<'a, PorticoResult<()>> {
        Box::pin(async move {
            let mut files = UploadedFiles::new();
            let fields = walk_parts(content_type, body, |file| files.push(file)).await?;
            ctx.set_extension(fields);
            ctx.set_extension(files);
            Ok(())
        })
    }
}

/// The multipart negotiation middleware.
///
/// Injected ahead of every route handler. Non-multipart requests pass
/// through untouched; the stage never rejects a request for lacking a
/// body.
pub struct MultipartStage {
    enabled: bool,
    resolver: Option<UploadResolver>,
    fields_only: Arc<dyn BodyHandler>,
}

impl MultipartStage {
    /// Creates the stage from the upload document, without a resolver.
    #[must_use]
    pub fn new(settings: UploadSettings) -> Self {
        Self {
            enabled: settings.enabled,
            resolver: None,
            fields_only: Arc::new(FieldsOnly),
        }
    }

    /// Creates the stage with a per-request handler resolver. The
    /// resolver is only consulted when uploads are enabled.
    #[must_use]
    pub fn with_resolver(settings: UploadSettings, resolver: UploadResolver) -> Self {
        Self {
            enabled: settings.enabled,
            resolver: Some(resolver),
            ..Self::new(settings)
        }
    }

    fn select_handler(&self, request: &Request) -> Arc<dyn BodyHandler> {
        if self.enabled {
            if let Some(resolver) = &self.resolver {
                if let Some(handler) = resolver(request) {
                    return handler;
                }
            }
        }
        self.fields_only.clone()
    }
}

/// Returns the full content-type header when it declares multipart
/// form data.
fn multipart_content_type(request: &Request) -> Option<String> {
    let raw = request
        .headers()
        .get(http::header::CONTENT_TYPE)?
        .to_str()
        .ok()?;
    let parsed: mime::Mime = raw.parse().ok()?;
    (parsed.type_() == mime::MULTIPART && parsed.subtype() == mime::FORM_DATA)
        .then(|| raw.to_string())
}

impl Middleware for MultipartStage {
    fn name(&self) -> &'static str {
        "multipart"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, PorticoResult<Response>> {
        Box::pin(async move {
            let Some(content_type) = multipart_content_type(&request) else {
                return next.run(ctx, request).await;
            };

            let (parts, body) = request.into_parts();
            let collected = match body.collect().await {
                Ok(collected) => collected,
                Err(never) => match never {},
            };
            let bytes = collected.to_bytes();
            let request = Request::from_parts(parts, Full::new(bytes.clone()));

            let handler = self.select_handler(&request);
            tracing::debug!(handler = handler.name(), "parsing multipart body");
            handler.parse(ctx, &content_type, bytes).await?;

            next.run(ctx, request).await
        })
    }
}

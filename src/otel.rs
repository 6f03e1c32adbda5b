use anyhow::anyhow;
use opentelemetry::global;
use opentelemetry::metrics::Meter;
use opentelemetry::propagation::TextMapCompositePropagator;
use opentelemetry::trace::TracerProvider;
use opentelemetry_appender_tracing::layer::OpenTelemetryTracingBridge;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::logs::{BatchLogProcessor, SdkLoggerProvider};
use opentelemetry_sdk::metrics::{PeriodicReader, SdkMeterProvider};
use opentelemetry_sdk::propagation::{BaggagePropagator, TraceContextPropagator};
use opentelemetry_sdk::trace::{BatchSpanProcessor, SdkTracerProvider};
use std::env;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::subscriber;
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;
use tracing_subscriber::layer::SubscriberExt;

const DEFAULT_SERVICE: &str = "trip-planner";

/// Initialize OpenTelemetry and return a guard that ensures proper cleanup
pub fn init_otel() -> Result<OtelGuard, anyhow::Error> {
    let providers = OtelProviders::init(ExportTarget::from_env())?;
    Ok(OtelGuard { providers })
}

/// Creates or returns metric generator
pub fn get_meter() -> &'static Meter {
    static METER: OnceLock<Meter> = OnceLock::new();
    METER.get_or_init(|| global::meter(get_service().as_str()))
}

/// Guard that ensures OpenTelemetry providers are properly shut down
pub struct OtelGuard {
    providers: OtelProviders,
}

/// Calls `providers.shutdown()` on success of failure
impl Drop for OtelGuard {
    fn drop(&mut self) {
        if let Err(e) = self.providers.shutdown() {
            eprintln!("Error during OpenTelemetry shutdown: {}", e);
        }
    }
}

/// Where telemetry goes.
///
/// stdout is reserved for the itinerary and flight table, so the stdout
/// exporters are opt-in through `OTEL_EXPORTER=stdout`.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ExportTarget {
    Otlp(String),
    Stdout,
    Disabled,
}

impl ExportTarget {
    fn from_env() -> Self {
        Self::select(
            env::var("OTEL_EXPORTER_OTLP_ENDPOINT").ok(),
            env::var("OTEL_EXPORTER").ok(),
        )
    }

    fn select(endpoint: Option<String>, exporter: Option<String>) -> Self {
        match (endpoint, exporter.as_deref()) {
            (Some(endpoint), _) if !endpoint.trim().is_empty() => ExportTarget::Otlp(endpoint),
            (_, Some("stdout")) => ExportTarget::Stdout,
            _ => ExportTarget::Disabled,
        }
    }
}

/// Wraps OTEL log, trace, and metric providers
struct OtelProviders {
    log_provider: SdkLoggerProvider,
    trace_provider: SdkTracerProvider,
    meter_provider: SdkMeterProvider,
}

impl OtelProviders {
    fn init(target: ExportTarget) -> Result<OtelProviders, anyhow::Error> {
        let log_provider = init_logs(&target)?;

        let otel_layer = OpenTelemetryTracingBridge::new(&log_provider);
        let filter_otel = EnvFilter::new("info")
            .add_directive("hyper=off".parse()?)
            .add_directive("tonic=off".parse()?)
            .add_directive("h2=off".parse()?)
            .add_directive("rig=off".parse()?)
            .add_directive("reqwest=off".parse()?);
        let log_layer = otel_layer.with_filter(filter_otel);
        let fmt_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_filter(fmt_filter);

        let trace_provider = init_traces(&target)?;
        let tracing_layer = OpenTelemetryLayer::new(trace_provider.tracer(get_service().as_str()))
            .with_filter(EnvFilter::new("info").add_directive("opentelemetry=info".parse()?));

        let subscriber = tracing_subscriber::registry()
            .with(log_layer)
            .with(tracing_layer)
            .with(fmt_layer);
        subscriber::set_global_default(subscriber)?;

        let meter_provider = init_metrics(&target)?;

        Ok(OtelProviders {
            trace_provider,
            log_provider,
            meter_provider,
        })
    }

    fn shutdown(&self) -> Result<(), anyhow::Error> {
        let mut shutdown_errors = Vec::new();
        if let Err(e) = self.log_provider.shutdown() {
            shutdown_errors.push(format!("Shutdown log provider failed: {}", e));
        }
        if let Err(e) = self.trace_provider.shutdown() {
            shutdown_errors.push(format!("Shutdown trace provider failed: {}", e));
        }
        if let Err(e) = self.meter_provider.shutdown() {
            shutdown_errors.push(format!("Shutdown meter provider failed: {}", e));
        }
        if !shutdown_errors.is_empty() {
            return Err(anyhow!(
                "Failed to shutdown providers:{}",
                shutdown_errors.join("\n")
            ));
        }
        Ok(())
    }
}

fn get_service() -> &'static String {
    static SERVICE: OnceLock<String> = OnceLock::new();
    SERVICE.get_or_init(|| env::var("OTEL_SERVICE_NAME").unwrap_or(DEFAULT_SERVICE.to_owned()))
}

fn get_resource() -> Resource {
    static RESOURCE: OnceLock<Resource> = OnceLock::new();
    RESOURCE
        .get_or_init(|| {
            Resource::builder()
                .with_service_name(get_service().as_str())
                .build()
        })
        .clone()
}

fn init_traces(target: &ExportTarget) -> Result<SdkTracerProvider, anyhow::Error> {
    global::set_text_map_propagator(TextMapCompositePropagator::new(vec![
        Box::new(BaggagePropagator::new()),
        Box::new(TraceContextPropagator::new()),
    ]));

    let batch_config = opentelemetry_sdk::trace::BatchConfigBuilder::default()
        .with_max_queue_size(1000)
        .with_scheduled_delay(Duration::from_secs(1))
        .with_max_export_batch_size(100)
        .build();
    let builder = SdkTracerProvider::builder().with_resource(get_resource());
    let provider = match target {
        ExportTarget::Otlp(endpoint) => {
            let exporter = opentelemetry_otlp::SpanExporter::builder()
                .with_tonic()
                .with_endpoint(endpoint.clone())
                .build()?;
            builder
                .with_span_processor(BatchSpanProcessor::new(exporter, batch_config))
                .build()
        }
        ExportTarget::Stdout => {
            let exporter = opentelemetry_stdout::SpanExporter::default();
            builder
                .with_span_processor(BatchSpanProcessor::new(exporter, batch_config))
                .build()
        }
        ExportTarget::Disabled => builder.build(),
    };

    global::set_tracer_provider(provider.clone());
    Ok(provider)
}

fn init_metrics(target: &ExportTarget) -> Result<SdkMeterProvider, anyhow::Error> {
    let builder = SdkMeterProvider::builder().with_resource(get_resource());
    let provider = match target {
        ExportTarget::Otlp(endpoint) => {
            let exporter = opentelemetry_otlp::MetricExporter::builder()
                .with_tonic()
                .with_endpoint(endpoint.clone())
                .build()?;
            builder
                .with_reader(
                    PeriodicReader::builder(exporter)
                        .with_interval(Duration::from_secs(1))
                        .build(),
                )
                .build()
        }
        ExportTarget::Stdout => {
            let exporter = opentelemetry_stdout::MetricExporter::builder().build();
            builder
                .with_reader(
                    PeriodicReader::builder(exporter)
                        .with_interval(Duration::from_secs(1))
                        .build(),
                )
                .build()
        }
        ExportTarget::Disabled => builder.build(),
    };
    global::set_meter_provider(provider.clone());
    Ok(provider)
}

fn init_logs(target: &ExportTarget) -> Result<SdkLoggerProvider, anyhow::Error> {
    let builder = SdkLoggerProvider::builder().with_resource(get_resource());
    let provider = match target {
        ExportTarget::Otlp(endpoint) => {
            let exporter = opentelemetry_otlp::LogExporter::builder()
                .with_tonic()
                .with_endpoint(endpoint.clone())
                .build()?;
            builder
                .with_log_processor(BatchLogProcessor::builder(exporter).build())
                .build()
        }
        ExportTarget::Stdout => builder
            .with_log_processor(
                BatchLogProcessor::builder(opentelemetry_stdout::LogExporter::default()).build(),
            )
            .build(),
        ExportTarget::Disabled => builder.build(),
    };
    Ok(provider)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_meter_once_lock() {
        let meter1 = get_meter();
        let meter2 = get_meter();
        assert!(std::ptr::eq(meter1, meter2));
    }

    #[test]
    fn test_endpoint_selects_otlp() {
        let target = ExportTarget::select(Some("http://localhost:4317".to_string()), None);
        assert_eq!(target, ExportTarget::Otlp("http://localhost:4317".to_string()));
    }

    #[test]
    fn test_endpoint_wins_over_stdout() {
        let target = ExportTarget::select(
            Some("http://collector:4317".to_string()),
            Some("stdout".to_string()),
        );
        assert!(matches!(target, ExportTarget::Otlp(_)));
    }

    #[test]
    fn test_stdout_is_opt_in() {
        assert_eq!(
            ExportTarget::select(None, Some("stdout".to_string())),
            ExportTarget::Stdout
        );
        assert_eq!(ExportTarget::select(None, None), ExportTarget::Disabled);
        assert_eq!(
            ExportTarget::select(Some("  ".to_string()), None),
            ExportTarget::Disabled
        );
    }
}

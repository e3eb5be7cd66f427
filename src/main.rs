use std::collections::HashMap;

use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDate;
use dotenvy::dotenv;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{error, info};

use booking_client::config::environment::EnvironmentConfig;
use booking_client::controllers::ReservasView;
use booking_client::models::filtros::{FiltroEstado, FiltrosReserva};
use booking_client::models::reserva::{EstadoReserva, LadoCalificacion};
use booking_client::services::ReservasTab;
use booking_client::store::PasoReset;
use booking_client::utils::validation::PasswordChecks;
use booking_client::AppState;

const USAGE: &str = "\
Uso: booking_client <comando> [argumentos]

Comandos:
  reservas [mine|asProvider|schedule] [pagina] [--search T] [--servicio T]
           [--empresa T] [--contacto T] [--estado E] [--desde AAAA-MM-DD] [--hasta AAAA-MM-DD]
  accion <id> <estado> [observacion...] [--tab mine|asProvider]
  confirmar <id>
  calificar <id> <cliente|proveedor> <puntaje> [comentario...] [--nps N]
  reset-password <email>
  usuarios [pagina] [busqueda]";

/// Argumentos posicionales y opciones `--clave valor`
struct Args {
    positional: Vec<String>,
    options: HashMap<String, String>,
}

impl Args {
    fn parse(mut raw: impl Iterator<Item = String>) -> Result<Self> {
        let mut positional = Vec::new();
        let mut options = HashMap::new();
        while let Some(arg) = raw.next() {
            match arg.strip_prefix("--") {
                Some(key) => {
                    let value = raw
                        .next()
                        .ok_or_else(|| anyhow!("Falta el valor de --{}", key))?;
                    options.insert(key.to_string(), value);
                }
                None => positional.push(arg),
            }
        }
        Ok(Self { positional, options })
    }

    fn get(&self, index: usize) -> Option<&str> {
        self.positional.get(index).map(String::as_str)
    }

    fn require(&self, index: usize, name: &str) -> Result<&str> {
        self.get(index).ok_or_else(|| anyhow!("Falta el argumento <{}>\n\n{}", name, USAGE))
    }

    fn option(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(String::as_str)
    }

    fn rest(&self, from: usize) -> String {
        self.positional.iter().skip(from).cloned().collect::<Vec<_>>().join(" ")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();
    let config = EnvironmentConfig::from_env()?;

    // Configurar logging
    let level = config
        .log_level
        .parse::<tracing::Level>()
        .unwrap_or(tracing::Level::INFO);
    tracing_subscriber::fmt().with_max_level(level).init();

    info!("📅 Booking Client - Marketplace de servicios");
    info!("🌍 Entorno: {}", config.environment);

    let mut raw = std::env::args().skip(1);
    let Some(command) = raw.next() else {
        println!("{}", USAGE);
        return Ok(());
    };
    let args = Args::parse(raw)?;
    let state = AppState::new(config)?;

    let result = match command.as_str() {
        "reservas" => listar_reservas(&state, &args).await,
        "accion" => ejecutar_accion(&state, &args).await,
        "confirmar" => confirmar(&state, &args).await,
        "calificar" => calificar(&state, &args).await,
        "reset-password" => reset_password(&state, &args).await,
        "usuarios" => listar_usuarios(&state, &args).await,
        other => Err(anyhow!("Comando desconocido: '{}'\n\n{}", other, USAGE)),
    };

    if let Err(e) = &result {
        error!("❌ {}", e);
    }
    result
}

fn parse_fecha(value: Option<&str>) -> Result<Option<NaiveDate>> {
    value
        .map(|v| NaiveDate::parse_from_str(v, "%Y-%m-%d"))
        .transpose()
        .context("Fecha inválida, se espera AAAA-MM-DD")
}

async fn listar_reservas(state: &AppState, args: &Args) -> Result<()> {
    let tab = match args.get(0) {
        Some(tab) => tab.parse::<ReservasTab>()?,
        None => ReservasTab::Mine,
    };
    let page = match args.get(1) {
        Some(page) => page.parse::<u32>().context("Página inválida")?,
        None => 1,
    };

    let filtros = FiltrosReserva {
        search: args.option("search").unwrap_or_default().to_string(),
        nombre_servicio: args.option("servicio").unwrap_or_default().to_string(),
        nombre_empresa: args.option("empresa").unwrap_or_default().to_string(),
        nombre_contacto: args.option("contacto").unwrap_or_default().to_string(),
        fecha_desde: parse_fecha(args.option("desde"))?,
        fecha_hasta: parse_fecha(args.option("hasta"))?,
        estado: match args.option("estado") {
            Some(estado) => FiltroEstado::Estado(estado.parse::<EstadoReserva>()?),
            None => FiltroEstado::Todos,
        },
    };

    let controller = &state.reservas;
    let tab_loaded = controller.set_tab(tab).await?;
    if tab == ReservasTab::Schedule {
        println!("📅 La agenda no tiene listado de reservas");
        return Ok(());
    }
    let filtros_loaded = controller.set_filtros(filtros).await?;
    if !tab_loaded && !filtros_loaded {
        controller.load(1).await?;
    }
    if page > 1 {
        controller.go_to_page(page).await?;
    }

    print_reservas(&controller.snapshot().await);
    Ok(())
}

fn print_reservas(view: &ReservasView) {
    println!(
        "📋 Reservas '{}' - página {}/{} ({} en total, {} filtros activos)",
        view.tab,
        view.pagination.page,
        view.pagination.total_pages(),
        view.pagination.total,
        view.active_filters
    );
    for reserva in &view.reservas {
        let fecha = reserva
            .fecha
            .map(|f| f.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "-".to_string());
        let hora = reserva
            .hora_inicio
            .map(|h| h.format("%H:%M").to_string())
            .unwrap_or_default();
        println!(
            "  #{:<6} {} {:<5} {:<11} {} | {} | ${}",
            reserva.id_reserva,
            fecha,
            hora,
            reserva.estado,
            reserva.nombre_servicio,
            reserva.nombre_empresa,
            reserva.precio_servicio
        );

        let acciones: Vec<&str> = reserva
            .acciones_disponibles()
            .iter()
            .map(EstadoReserva::as_str)
            .collect();
        if !acciones.is_empty() {
            println!("          acciones: {}", acciones.join(", "));
        }
        let lado = match view.tab {
            ReservasTab::AsProvider => LadoCalificacion::Proveedor,
            _ => LadoCalificacion::Cliente,
        };
        if reserva.puede_calificar(lado) {
            println!("          ⭐ pendiente de calificar");
        }
    }
    let counts = view.counts;
    println!(
        "📊 pendientes {} · aprobadas {} · rechazadas {} · canceladas {} · completadas {}",
        counts.pendientes, counts.aprobadas, counts.rechazadas, counts.canceladas, counts.completadas
    );
    if let Some(error) = &view.error {
        println!("⚠️ {}", error);
    }
}

/// Recorrer las páginas de una pestaña hasta encontrar la reserva
async fn locate(state: &AppState, tab: ReservasTab, id_reserva: i64) -> Result<()> {
    let controller = &state.reservas;
    if !controller.set_tab(tab).await? {
        controller.load(1).await?;
    }
    loop {
        let view = controller.snapshot().await;
        if view.reservas.iter().any(|r| r.id_reserva == id_reserva) {
            return Ok(());
        }
        if !view.pagination.has_next() {
            bail!("La reserva {} no aparece en '{}'", id_reserva, tab);
        }
        controller.go_to_page(view.pagination.page + 1).await?;
    }
}

fn print_outcome(view: &ReservasView) {
    if let Some(advertencia) = &view.advertencia {
        println!("⚠️ {}", advertencia);
    }
    if let Some(exito) = &view.mensaje_exito {
        println!("✅ {}", exito);
    }
}

async fn ejecutar_accion(state: &AppState, args: &Args) -> Result<()> {
    let id_reserva: i64 = args.require(0, "id")?.parse().context("Id inválido")?;
    let accion: EstadoReserva = args.require(1, "estado")?.parse()?;
    let tab = match args.option("tab") {
        Some(tab) => tab.parse::<ReservasTab>()?,
        None => ReservasTab::AsProvider,
    };

    locate(state, tab, id_reserva).await?;
    let controller = &state.reservas;
    controller.request_action(id_reserva, accion).await?;
    controller.set_observacion(&args.rest(2)).await;

    let result = controller.confirm_action().await;
    let view = controller.snapshot().await;
    if let Err(e) = result {
        let message = view
            .mensaje_error
            .unwrap_or_else(|| e.user_message("No se pudo actualizar la reserva"));
        bail!("{}", message);
    }
    print_outcome(&view);
    Ok(())
}

async fn confirmar(state: &AppState, args: &Args) -> Result<()> {
    let id_reserva: i64 = args.require(0, "id")?.parse().context("Id inválido")?;
    locate(state, ReservasTab::AsProvider, id_reserva).await?;
    state.reservas.quick_confirm(id_reserva).await?;
    print_outcome(&state.reservas.snapshot().await);
    Ok(())
}

async fn calificar(state: &AppState, args: &Args) -> Result<()> {
    let id_reserva: i64 = args.require(0, "id")?.parse().context("Id inválido")?;
    let (lado, tab) = match args.require(1, "lado")? {
        "cliente" => (LadoCalificacion::Cliente, ReservasTab::Mine),
        "proveedor" => (LadoCalificacion::Proveedor, ReservasTab::AsProvider),
        other => bail!("Lado desconocido: '{}' (cliente|proveedor)", other),
    };
    let puntaje: u8 = args.require(2, "puntaje")?.parse().context("Puntaje inválido")?;
    let nps = args
        .option("nps")
        .map(str::parse::<u8>)
        .transpose()
        .context("NPS inválido")?;

    locate(state, tab, id_reserva).await?;
    state
        .reservas
        .calificar(id_reserva, lado, puntaje, &args.rest(3), nps)
        .await?;
    print_outcome(&state.reservas.snapshot().await);
    Ok(())
}

async fn prompt(
    lines: &mut tokio::io::Lines<BufReader<tokio::io::Stdin>>,
    label: &str,
) -> Result<String> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(label.as_bytes()).await?;
    stdout.flush().await?;
    let line = lines
        .next_line()
        .await?
        .ok_or_else(|| anyhow!("Entrada cerrada"))?;
    Ok(line.trim().to_string())
}

async fn reset_password(state: &AppState, args: &Args) -> Result<()> {
    let controller = &state.password_reset;
    controller.set_email(args.require(0, "email")?).await;

    if controller.submit_email().await? != PasoReset::Code {
        let wizard = controller.snapshot().await;
        bail!("{}", wizard.error().unwrap_or("No se pudo enviar el código"));
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while controller.paso().await == PasoReset::Code {
        let wizard = controller.snapshot().await;
        if let Some(message) = wizard.message() {
            println!("📧 {}", message);
        }
        let restante = wizard
            .countdown()
            .remaining()
            .map(|s| format!("{}s", s))
            .unwrap_or_else(|| "verificado".to_string());
        let input = prompt(
            &mut lines,
            &format!("Código de 4 dígitos ({}, 'reenviar' para otro): ", restante),
        )
        .await?;

        let result = if input == "reenviar" {
            controller.resend().await
        } else {
            controller.set_code(&input).await;
            controller.submit_code().await
        };
        if let Err(e) = result {
            println!("⚠️ {}", e.user_message("Código incorrecto"));
        } else if let Some(error) = controller.snapshot().await.error() {
            println!("⚠️ {}", error);
        }
    }

    while controller.paso().await == PasoReset::NewPassword {
        let new_password = prompt(&mut lines, "Nueva contraseña: ").await?;
        let confirm_password = prompt(&mut lines, "Repite la contraseña: ").await?;
        controller.set_passwords(&new_password, &confirm_password).await;

        match controller.submit_password().await {
            Ok(PasoReset::Success) => {}
            Ok(_) => {
                if let Some(error) = controller.snapshot().await.error() {
                    println!("⚠️ {}", error);
                }
            }
            Err(e) => {
                println!("⚠️ {}", e.user_message("No se pudo actualizar la contraseña"));
                print_password_checks(&controller.snapshot().await.password_checks());
            }
        }
    }

    if let Some(message) = controller.snapshot().await.message() {
        println!("🔐 {}", message);
    }
    controller.stop_countdown().await;
    Ok(())
}

fn print_password_checks(checks: &PasswordChecks) {
    if checks.is_strong() {
        return;
    }
    let marca = |ok: bool| if ok { "✅" } else { "❌" };
    println!("  {} al menos 8 caracteres", marca(checks.length));
    println!("  {} una mayúscula", marca(checks.uppercase));
    println!("  {} una minúscula", marca(checks.lowercase));
    println!("  {} un número", marca(checks.digit));
    println!("  {} un carácter especial", marca(checks.special));
}

async fn listar_usuarios(state: &AppState, args: &Args) -> Result<()> {
    let page = match args.get(0) {
        Some(page) => page.parse::<u32>().context("Página inválida")?,
        None => 1,
    };
    let search = args.get(1);

    let usuarios = state.admin_users.listar_usuarios(page, search).await?;
    println!("👥 Usuarios - página {} ({} en total)", page, usuarios.total);
    for usuario in &usuarios.usuarios {
        println!(
            "  #{:<6} {:<30} {:<30} {}",
            usuario.id,
            usuario.display_name(),
            usuario.email,
            if usuario.estado { "activo" } else { "inactivo" }
        );
    }
    Ok(())
}
